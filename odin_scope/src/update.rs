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

use std::fmt;
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use serde_repr::{Serialize_repr,Deserialize_repr};
use uuid::Uuid;

use crate::errors::{Result,OdinScopeError,parse_error};

/// `UpdateType` discriminator value of track updates
pub const TRACK_UPDATE: i64 = 0;
/// `UpdateType` discriminator value of flight plan updates
pub const FLIGHT_PLAN_UPDATE: i64 = 1;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize_repr,Deserialize_repr)]
#[repr(u8)]
pub enum AltitudeType {
    Pressure = 0,
    True = 1,
}

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all="PascalCase")]
pub struct Altitude {
    pub value: i32, // ft
    pub altitude_type: AltitudeType,
}

impl fmt::Display for Altitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.altitude_type {
            AltitudeType::Pressure => write!( f, "{}ft(p)", self.value),
            AltitudeType::True => write!( f, "{}ft", self.value),
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
#[serde(rename_all="PascalCase")]
pub struct GeoPos {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for GeoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "({:.5},{:.5})", self.latitude, self.longitude)
    }
}

/// leader line direction of a datablock. On the wire this is either the enum index or its name
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
#[serde(try_from="LdrDirectionRepr")]
pub enum LdrDirection { N, NE, E, SE, S, SW, W, NW }

const LDR_DIRECTIONS: [LdrDirection;8] = {
    use LdrDirection::*;
    [N, NE, E, SE, S, SW, W, NW]
};

#[derive(Deserialize)]
#[serde(untagged)]
enum LdrDirectionRepr { Index(u8), Name(String) }

impl TryFrom<LdrDirectionRepr> for LdrDirection {
    type Error = OdinScopeError;

    fn try_from (repr: LdrDirectionRepr)->Result<Self> {
        match repr {
            LdrDirectionRepr::Index(i) => LDR_DIRECTIONS.get(i as usize).copied()
                .ok_or_else( || parse_error!("invalid LDR direction index {}", i)),
            LdrDirectionRepr::Name(s) => LDR_DIRECTIONS.iter().find( |d| d.as_str().eq_ignore_ascii_case( s.as_str())).copied()
                .ok_or_else( || parse_error!("invalid LDR direction '{}'", s))
        }
    }
}

impl LdrDirection {
    pub fn as_str (&self)->&'static str {
        use LdrDirection::*;
        match self { N => "N", NE => "NE", E => "E", SE => "SE", S => "S", SW => "SW", W => "W", NW => "NW" }
    }
}

impl fmt::Display for LdrDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!( f, "{}", self.as_str()) }
}

/// sparse track state change. Fields that are `None` did not change and must not overwrite anything
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(rename_all="PascalCase")]
pub struct TrackUpdate {
    pub guid: Uuid,
    #[serde(rename="TimeStamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)] pub callsign: Option<String>,
    #[serde(default)] pub altitude: Option<Altitude>,
    #[serde(default)] pub ground_speed: Option<i32>,
    #[serde(default)] pub ground_track: Option<i32>,
    #[serde(default)] pub location: Option<GeoPos>,
    #[serde(default)] pub ident: Option<bool>,
    #[serde(default)] pub is_on_ground: Option<bool>,
    #[serde(default)] pub mode_s_code: Option<u32>,
    #[serde(default)] pub squawk: Option<String>,
    #[serde(default)] pub vertical_rate: Option<i32>,
}

impl TrackUpdate {
    pub fn new (guid: Uuid, timestamp: DateTime<Utc>)->Self {
        TrackUpdate {
            guid, timestamp,
            callsign: None, altitude: None, ground_speed: None, ground_track: None, location: None,
            ident: None, is_on_ground: None, mode_s_code: None, squawk: None, vertical_rate: None
        }
    }
}

/// sparse flight plan state change
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(rename_all="PascalCase")]
pub struct FlightPlanUpdate {
    pub guid: Uuid,
    #[serde(rename="TimeStamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)] pub aircraft_type: Option<String>,
    #[serde(default)] pub callsign: Option<String>,
    #[serde(default)] pub destination: Option<String>,
    #[serde(default)] pub flight_rules: Option<String>,
    #[serde(default)] pub wake_category: Option<String>,
    #[serde(default)] pub owner: Option<String>,
    #[serde(default)] pub pending_handoff: Option<String>,
    #[serde(default)] pub requested_altitude: Option<i32>,
    #[serde(default)] pub scratchpad1: Option<String>,
    #[serde(default)] pub scratchpad2: Option<String>,
    #[serde(default, rename="LDRDirection")] pub ldr_direction: Option<LdrDirection>,
    #[serde(default)] pub associated_track_guid: Option<Uuid>,
}

impl FlightPlanUpdate {
    pub fn new (guid: Uuid, timestamp: DateTime<Utc>)->Self {
        FlightPlanUpdate {
            guid, timestamp,
            aircraft_type: None, callsign: None, destination: None, flight_rules: None, wake_category: None,
            owner: None, pending_handoff: None, requested_altitude: None, scratchpad1: None, scratchpad2: None,
            ldr_direction: None, associated_track_guid: None
        }
    }
}

/// the closed set of updates we process
#[derive(Debug,Clone)]
pub enum Update {
    Track(TrackUpdate),
    FlightPlan(FlightPlanUpdate),
}

impl Update {
    pub fn id (&self)->Uuid {
        match self {
            Update::Track(u) => u.guid,
            Update::FlightPlan(u) => u.guid,
        }
    }

    pub fn timestamp (&self)->DateTime<Utc> {
        match self {
            Update::Track(u) => u.timestamp,
            Update::FlightPlan(u) => u.timestamp,
        }
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Track(u) => write!( f, "TrackUpdate( guid: {}, time: {} )", u.guid, u.timestamp),
            Update::FlightPlan(u) => write!( f, "FlightPlanUpdate( guid: {}, time: {} )", u.guid, u.timestamp),
        }
    }
}

/// the minimal part of each message we need to pick the update variant
#[derive(Deserialize)]
#[serde(rename_all="PascalCase")]
struct Envelope {
    update_type: i64
}

/// two stage decoding of a raw message: envelope first, then the matching variant.
/// Unknown discriminators are not an error - they return `Ok(None)`
pub fn decode_update (msg: &str)->Result<Option<Update>> {
    let envelope: Envelope = serde_json::from_str( msg)?;
    match envelope.update_type {
        TRACK_UPDATE => Ok( Some( Update::Track( serde_json::from_str( msg)?))),
        FLIGHT_PLAN_UPDATE => Ok( Some( Update::FlightPlan( serde_json::from_str( msg)?))),
        _ => Ok(None)
    }
}
