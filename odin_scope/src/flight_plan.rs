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

use crate::fields::{FieldId,FieldTimes};
use crate::update::{FlightPlanUpdate,LdrDirection};

/// the mergeable fields of a [`FlightPlan`]
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,EnumCount)]
pub enum FlightPlanField {
    AircraftType,
    Callsign,
    Destination,
    FlightRules,
    WakeCategory,
    Owner,
    PendingHandoff,
    RequestedAltitude,
    Scratchpad1,
    Scratchpad2,
    LdrDirection,
    AssociatedTrack,
}

impl FieldId for FlightPlanField {
    fn index (self)->usize { self as usize }
}

pub type FlightPlanTimes = FieldTimes<FlightPlanField,{FlightPlanField::COUNT}>;

/// filed / clearance state of a flight. The associated track is a plain id (no ownership), it
/// gets resolved through the [`crate::store::EntityStore`]
#[derive(Debug,Clone,PartialEq)]
pub struct FlightPlan {
    pub id: Uuid,

    pub aircraft_type: Option<String>,
    pub callsign: Option<String>,
    pub destination: Option<String>,
    pub flight_rules: Option<String>,
    pub wake_category: Option<String>,
    pub owner: Option<String>,
    pub pending_handoff: Option<String>,
    pub requested_altitude: Option<i32>,
    pub scratchpad1: Option<String>,
    pub scratchpad2: Option<String>,
    pub ldr_direction: Option<LdrDirection>,
    pub associated_track: Option<Uuid>,

    pub field_times: FlightPlanTimes,
}

impl FlightPlan {
    pub fn new (id: Uuid)->Self {
        FlightPlan {
            id,
            aircraft_type: None, callsign: None, destination: None, flight_rules: None, wake_category: None,
            owner: None, pending_handoff: None, requested_altitude: None, scratchpad1: None, scratchpad2: None,
            ldr_direction: None, associated_track: None,
            field_times: FlightPlanTimes::new()
        }
    }

    /// merge a sparse update field by field. Returns the applied fields, which includes fields that were
    /// re-set to an equal value by a not-older update.
    /// Note that an update without associated track leaves a previous association in place
    pub fn merge (&mut self, update: &FlightPlanUpdate)->Vec<FlightPlanField> {
        use FlightPlanField as F;
        let ts = update.timestamp;
        let ft = &mut self.field_times;
        let mut applied = Vec::new();

        if ft.merge( F::AircraftType, &mut self.aircraft_type, &update.aircraft_type, ts) { applied.push(F::AircraftType) }
        if ft.merge( F::Callsign, &mut self.callsign, &update.callsign, ts) { applied.push(F::Callsign) }
        if ft.merge( F::Destination, &mut self.destination, &update.destination, ts) { applied.push(F::Destination) }
        if ft.merge( F::FlightRules, &mut self.flight_rules, &update.flight_rules, ts) { applied.push(F::FlightRules) }
        if ft.merge( F::WakeCategory, &mut self.wake_category, &update.wake_category, ts) { applied.push(F::WakeCategory) }
        if ft.merge( F::Owner, &mut self.owner, &update.owner, ts) { applied.push(F::Owner) }
        if ft.merge( F::PendingHandoff, &mut self.pending_handoff, &update.pending_handoff, ts) { applied.push(F::PendingHandoff) }
        if ft.merge( F::RequestedAltitude, &mut self.requested_altitude, &update.requested_altitude, ts) { applied.push(F::RequestedAltitude) }
        if ft.merge( F::Scratchpad1, &mut self.scratchpad1, &update.scratchpad1, ts) { applied.push(F::Scratchpad1) }
        if ft.merge( F::Scratchpad2, &mut self.scratchpad2, &update.scratchpad2, ts) { applied.push(F::Scratchpad2) }
        if ft.merge( F::LdrDirection, &mut self.ldr_direction, &update.ldr_direction, ts) { applied.push(F::LdrDirection) }
        if ft.merge( F::AssociatedTrack, &mut self.associated_track, &update.associated_track_guid, ts) { applied.push(F::AssociatedTrack) }

        applied
    }

    pub fn field_time (&self, field: FlightPlanField)->Option<DateTime<Utc>> { self.field_times.get(field) }
}

impl fmt::Display for FlightPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "FlightPlan( id: {}", self.id)?;
        if let Some(cs) = &self.callsign { write!( f, ", cs: \"{cs}\"")?; }
        if let Some(t) = &self.aircraft_type { write!( f, ", type: {t}")?; }
        if let Some(dest) = &self.destination { write!( f, ", dest: {dest}")?; }
        if let Some(owner) = &self.owner { write!( f, ", owner: {owner}")?; }
        if let Some(trk) = &self.associated_track { write!( f, ", track: {trk}")?; }
        write!( f, ")")
    }
}
