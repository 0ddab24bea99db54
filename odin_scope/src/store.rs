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

//! the shared entity state of a receiver
//!
//! Tracks and flight plans are kept in concurrent maps keyed by their id. Map shards are only locked
//! for lookup-or-create, the merge itself happens under the (per entity) mutex of the returned value.
//! Callers should not hold more than one entity lock at a time - clone a snapshot instead.

use std::sync::{Arc,Mutex,MutexGuard};
use dashmap::DashMap;
use uuid::Uuid;

use crate::track::Track;
use crate::flight_plan::FlightPlan;

pub type TrackRef = Arc<Mutex<Track>>;
pub type FlightPlanRef = Arc<Mutex<FlightPlan>>;

#[derive(Default)]
pub struct EntityStore {
    tracks: DashMap<Uuid,TrackRef>,
    flight_plans: DashMap<Uuid,FlightPlanRef>,
    track_assoc: DashMap<Uuid,Uuid>, // track id -> flight plan id
}

impl EntityStore {
    pub fn new ()->Self { Self::default() }

    /// returns the track for `id`, creating it if this is the first time we see it.
    /// Concurrent callers for the same id always get the same instance
    pub fn get_or_create_track (&self, id: Uuid)->TrackRef {
        self.tracks.entry(id).or_insert_with( || Arc::new( Mutex::new( Track::new(id)))).value().clone()
    }

    pub fn get_or_create_flight_plan (&self, id: Uuid)->FlightPlanRef {
        self.flight_plans.entry(id).or_insert_with( || Arc::new( Mutex::new( FlightPlan::new(id)))).value().clone()
    }

    pub fn track (&self, id: &Uuid)->Option<TrackRef> {
        self.tracks.get(id).map( |e| e.value().clone())
    }

    pub fn flight_plan (&self, id: &Uuid)->Option<FlightPlanRef> {
        self.flight_plans.get(id).map( |e| e.value().clone())
    }

    pub fn n_tracks (&self)->usize { self.tracks.len() }
    pub fn n_flight_plans (&self)->usize { self.flight_plans.len() }

    /// record that flight plan `fp_id` is associated with `track_id` (which is created if not yet known).
    /// If the flight plan was previously associated with another track that reverse link is dropped.
    /// There is no way to clear an association - a flight plan keeps its last associated track
    pub fn associate (&self, fp_id: Uuid, prev_track_id: Option<Uuid>, track_id: Uuid)->TrackRef {
        if let Some(prev) = prev_track_id {
            if prev != track_id {
                self.track_assoc.remove_if( &prev, |_,fp| *fp == fp_id);
            }
        }
        let track = self.get_or_create_track( track_id);
        self.track_assoc.insert( track_id, fp_id);
        track
    }

    /// the id of the flight plan currently associated with `track_id` (if any)
    pub fn associated_flight_plan_id (&self, track_id: &Uuid)->Option<Uuid> {
        self.track_assoc.get(track_id).map( |e| *e.value())
    }

    pub fn associated_flight_plan (&self, track_id: &Uuid)->Option<FlightPlanRef> {
        self.associated_flight_plan_id( track_id).and_then( |fp_id| self.flight_plan( &fp_id))
    }
}

/// lock an entity, recovering from a poisoned mutex
pub fn lock<T> (entity: &Mutex<T>)->MutexGuard<'_,T> {
    entity.lock().unwrap_or_else( |poisoned| poisoned.into_inner())
}

/// clone the current state of an entity without holding on to its lock
pub fn snapshot<T: Clone> (entity: &Mutex<T>)->T {
    lock(entity).clone()
}
