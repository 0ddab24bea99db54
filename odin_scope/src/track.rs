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
use strum::EnumCount;
use uuid::Uuid;

use crate::fields::{FieldId,FieldTimes,Timed};
use crate::update::{Altitude,GeoPos,TrackUpdate};

/// the mergeable fields of a [`Track`]
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,EnumCount)]
pub enum TrackField {
    Callsign,
    Altitude,
    GroundSpeed,
    GroundTrack,
    Location,
    Ident,
    IsOnGround,
    ModeSCode,
    Squawk,
    VerticalRate,
}

impl FieldId for TrackField {
    fn index (self)->usize { self as usize }
}

pub type TrackTimes = FieldTimes<TrackField,{TrackField::COUNT}>;

/// live surveillance state of a target. Values are `None` until the first update that sets them
#[derive(Debug,Clone,PartialEq)]
pub struct Track {
    pub id: Uuid,

    pub callsign: Option<String>,
    pub altitude: Option<Altitude>,
    pub ground_speed: Option<i32>, // kn
    pub ground_track: Option<i32>, // deg
    pub location: Option<GeoPos>,
    pub ident: Option<bool>,
    pub is_on_ground: Option<bool>,
    pub mode_s_code: Option<u32>,
    pub squawk: Option<String>,
    pub vertical_rate: Option<i32>, // ft/min

    pub field_times: TrackTimes,
}

impl Track {
    pub fn new (id: Uuid)->Self {
        Track {
            id,
            callsign: None, altitude: None, ground_speed: None, ground_track: None, location: None,
            ident: None, is_on_ground: None, mode_s_code: None, squawk: None, vertical_rate: None,
            field_times: TrackTimes::new()
        }
    }

    /// merge a sparse update field by field. Returns the applied fields, which includes fields that were
    /// re-set to an equal value by a not-older update
    pub fn merge (&mut self, update: &TrackUpdate)->Vec<TrackField> {
        use TrackField as F;
        let ts = update.timestamp;
        let ft = &mut self.field_times;
        let mut applied = Vec::new();

        if ft.merge( F::Callsign, &mut self.callsign, &update.callsign, ts) { applied.push(F::Callsign) }
        if ft.merge( F::Altitude, &mut self.altitude, &update.altitude, ts) { applied.push(F::Altitude) }
        if ft.merge( F::GroundSpeed, &mut self.ground_speed, &update.ground_speed, ts) { applied.push(F::GroundSpeed) }
        if ft.merge( F::GroundTrack, &mut self.ground_track, &update.ground_track, ts) { applied.push(F::GroundTrack) }
        if ft.merge( F::Location, &mut self.location, &update.location, ts) { applied.push(F::Location) }
        if ft.merge( F::Ident, &mut self.ident, &update.ident, ts) { applied.push(F::Ident) }
        if ft.merge( F::IsOnGround, &mut self.is_on_ground, &update.is_on_ground, ts) { applied.push(F::IsOnGround) }
        if ft.merge( F::ModeSCode, &mut self.mode_s_code, &update.mode_s_code, ts) { applied.push(F::ModeSCode) }
        if ft.merge( F::Squawk, &mut self.squawk, &update.squawk, ts) { applied.push(F::Squawk) }
        if ft.merge( F::VerticalRate, &mut self.vertical_rate, &update.vertical_rate, ts) { applied.push(F::VerticalRate) }

        applied
    }

    pub fn field_time (&self, field: TrackField)->Option<DateTime<Utc>> { self.field_times.get(field) }

    /// ground track together with the time it was last set
    pub fn timed_ground_track (&self)->Option<Timed<i32>> {
        self.ground_track.zip( self.field_times.get(TrackField::GroundTrack)).map( |(v,t)| Timed::new(v,t))
    }

    /// location together with the time it was last set
    pub fn timed_location (&self)->Option<Timed<GeoPos>> {
        self.location.zip( self.field_times.get(TrackField::Location)).map( |(v,t)| Timed::new(v,t))
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Track( id: {}", self.id)?;
        if let Some(cs) = &self.callsign { write!( f, ", cs: \"{cs}\"")?; }
        if let Some(pos) = &self.location { write!( f, ", pos: {pos}")?; }
        if let Some(alt) = &self.altitude { write!( f, ", alt: {alt}")?; }
        if let Some(spd) = self.ground_speed { write!( f, ", spd: {spd}")?; }
        if let Some(hdg) = self.ground_track { write!( f, ", hdg: {hdg}")?; }
        if let Some(sq) = &self.squawk { write!( f, ", squawk: {sq}")?; }
        write!( f, ")")
    }
}
