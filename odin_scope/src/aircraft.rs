/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use std::{fmt, sync::{Arc,Mutex}};
use chrono::{DateTime,Utc};
use dashmap::DashMap;
use uom::si::{f64::Angle, angle::degree};
use uuid::Uuid;

use crate::fields::Timed;
use crate::track::Track;
use crate::flight_plan::FlightPlan;
use crate::store::{lock,snapshot};
use crate::update::{Altitude,GeoPos};

pub type AircraftRef = Arc<Mutex<Aircraft>>;

/// converts a leader line direction name into a display angle
pub type LdrParser = fn(&str)->Option<Angle>;

/// the combined view of a track and its associated flight plan as used by displays.
/// Aircraft are owned by the presentation layer (see [`AircraftSink`]), we only update them in place
#[derive(Debug,Clone,PartialEq)]
pub struct Aircraft {
    pub id: Uuid, // of the track
    pub last_message_time: Option<DateTime<Utc>>,

    //--- flight plan sourced
    pub aircraft_type: Option<String>,
    pub flight_plan_callsign: Option<String>,
    pub destination: Option<String>,
    pub flight_rules: Option<String>,
    pub category: Option<String>, // wake category
    pub position_ind: Option<String>, // owning position
    pub pending_handoff: Option<String>,
    pub requested_altitude: Option<i32>,
    pub scratchpad: Option<String>,
    pub scratchpad2: Option<String>,
    pub ldr_direction: Option<Angle>,

    //--- track sourced
    pub callsign: Option<String>,
    pub altitude: Option<Altitude>,
    pub ground_speed: Option<i32>,
    pub track: Option<Timed<i32>>, // ground track with the time it was reported
    pub ident: Option<bool>,
    pub is_on_ground: Option<bool>,
    pub location: Option<Timed<GeoPos>>,
    pub mode_s_code: Option<u32>,
    pub squawk: Option<String>,
    pub vertical_rate: Option<i32>,
}

impl Aircraft {
    pub fn new (id: Uuid)->Self {
        Aircraft {
            id,
            last_message_time: None,
            aircraft_type: None, flight_plan_callsign: None, destination: None, flight_rules: None, category: None,
            position_ind: None, pending_handoff: None, requested_altitude: None, scratchpad: None, scratchpad2: None,
            ldr_direction: None,
            callsign: None, altitude: None, ground_speed: None, track: None, ident: None, is_on_ground: None,
            location: None, mode_s_code: None, squawk: None, vertical_rate: None
        }
    }

    /// advance the last message time. This never goes backwards
    pub fn set_last_message_time (&mut self, time: DateTime<Utc>)->bool {
        if self.last_message_time.map_or( true, |t| time > t) {
            self.last_message_time = Some(time);
            true
        } else {
            false
        }
    }

    /// set ground track if it is not older than what we have
    pub fn set_track (&mut self, track: Timed<i32>)->bool {
        if self.track.map_or( true, |t| track.time >= t.time) {
            self.track = Some(track);
            true
        } else {
            false
        }
    }

    /// set location if it is not older than what we have
    pub fn set_location (&mut self, location: Timed<GeoPos>)->bool {
        if self.location.map_or( true, |l| location.time >= l.time) {
            self.location = Some(location);
            true
        } else {
            false
        }
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Aircraft( id: {}", self.id)?;
        if let Some(cs) = &self.callsign { write!( f, ", cs: \"{cs}\"")?; }
        if let Some(cs) = &self.flight_plan_callsign { write!( f, ", fp_cs: \"{cs}\"")?; }
        if let Some(t) = &self.aircraft_type { write!( f, ", type: {t}")?; }
        if let Some(loc) = &self.location { write!( f, ", pos: {}", loc.value)?; }
        if let Some(alt) = &self.altitude { write!( f, ", alt: {alt}")?; }
        if let Some(hdg) = &self.track { write!( f, ", hdg: {}", hdg.value)?; }
        if let Some(spd) = self.ground_speed { write!( f, ", spd: {spd}")?; }
        if let Some(t) = self.last_message_time { write!( f, ", time: {t}")?; }
        write!( f, ")")
    }
}

/// project the current track and flight plan state onto an aircraft.
/// Flight plan fields come from the flight plan, kinematic and identity fields from the track
pub fn project (ac: &mut Aircraft, track: Option<&Track>, flight_plan: Option<&FlightPlan>, timestamp: DateTime<Utc>, ldr_parser: LdrParser) {
    ac.set_last_message_time( timestamp);

    if let Some(fp) = flight_plan {
        ac.aircraft_type = fp.aircraft_type.clone();
        ac.flight_plan_callsign = fp.callsign.clone();
        ac.destination = fp.destination.clone();
        ac.flight_rules = fp.flight_rules.clone();
        ac.category = fp.wake_category.clone();
        ac.position_ind = fp.owner.clone();
        ac.pending_handoff = fp.pending_handoff.clone();
        ac.requested_altitude = fp.requested_altitude;
        ac.scratchpad = fp.scratchpad1.clone();
        ac.scratchpad2 = fp.scratchpad2.clone();
        ac.ldr_direction = fp.ldr_direction.and_then( |dir| ldr_parser( dir.as_str()));
    }

    if let Some(track) = track {
        ac.callsign = track.callsign.clone();
        ac.altitude = track.altitude;
        ac.ground_speed = track.ground_speed;
        if let Some(hdg) = track.timed_ground_track() { ac.set_track( hdg); }
        ac.ident = track.ident;
        ac.is_on_ground = track.is_on_ground;
        if let Some(loc) = track.timed_location() { ac.set_location( loc); }
        ac.mode_s_code = track.mode_s_code;
        ac.squawk = track.squawk.clone();
        ac.vertical_rate = track.vertical_rate;
    }
}

/// default leader line direction helper: compass names (N, NE, ..) or numeric keypad digits (8 = N, 9 = NE, ..)
pub fn parse_ldr_direction (dir: &str)->Option<Angle> {
    let deg = match dir.trim().to_ascii_uppercase().as_str() {
        "N"  | "8" => 0.0,
        "NE" | "9" => 45.0,
        "E"  | "6" => 90.0,
        "SE" | "3" => 135.0,
        "S"  | "2" => 180.0,
        "SW" | "1" => 225.0,
        "W"  | "4" => 270.0,
        "NW" | "7" => 315.0,
        _ => return None
    };
    Some( Angle::new::<degree>(deg))
}

/// the interface of the presentation layer that owns the aircraft objects.
/// `create` tells the sink to add a new aircraft if there is none for `id` yet
pub trait AircraftSink: Send + Sync {
    fn get_aircraft (&self, id: Uuid, create: bool)->Option<AircraftRef>;
}

/// a simple concurrent aircraft collection that can be used as sink
#[derive(Default)]
pub struct AircraftList {
    aircraft: DashMap<Uuid,AircraftRef>,
}

impl AircraftList {
    pub fn new ()->Self { Self::default() }

    pub fn len (&self)->usize { self.aircraft.len() }
    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }

    /// a snapshot of the current state of aircraft `id`
    pub fn get (&self, id: &Uuid)->Option<Aircraft> {
        self.aircraft.get(id).map( |e| snapshot( e.value()))
    }

    pub fn snapshots (&self)->Vec<Aircraft> {
        self.aircraft.iter().map( |e| snapshot( e.value())).collect()
    }

    /// the presentation layer is responsible for dropping aircraft
    pub fn remove (&self, id: &Uuid)->Option<Aircraft> {
        self.aircraft.remove(id).map( |(_,ac)| lock(&ac).clone())
    }
}

impl AircraftSink for AircraftList {
    fn get_aircraft (&self, id: Uuid, create: bool)->Option<AircraftRef> {
        if create {
            Some( self.aircraft.entry(id).or_insert_with( || Arc::new( Mutex::new( Aircraft::new(id)))).value().clone())
        } else {
            self.aircraft.get(&id).map( |e| e.value().clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ldr () {
        assert_eq!( parse_ldr_direction("NE").map( |a| a.get::<degree>()), Some(45.0));
        assert_eq!( parse_ldr_direction("sw").map( |a| a.get::<degree>()), Some(225.0));
        assert_eq!( parse_ldr_direction("2").map( |a| a.get::<degree>()), Some(180.0));
        assert!( parse_ldr_direction("up").is_none());
    }
}
