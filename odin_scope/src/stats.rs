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

use std::{fmt, sync::atomic::{AtomicU64,Ordering}};

/// counters for everything a receiver consumed or dropped. Drops are not errors (they do not change
/// entity state) but we want to be able to see them
#[derive(Debug,Default)]
pub struct ReceiverStats {
    received: AtomicU64,
    track_updates: AtomicU64,
    flight_plan_updates: AtomicU64,
    unknown_updates: AtomicU64,
    decode_errors: AtomicU64,
    transport_errors: AtomicU64,
    reconnects: AtomicU64,
}

#[inline] fn bump (counter: &AtomicU64) { counter.fetch_add( 1, Ordering::Relaxed); }
#[inline] fn get (counter: &AtomicU64)->u64 { counter.load( Ordering::Relaxed) }

impl ReceiverStats {
    pub fn new ()->Self { Self::default() }

    pub(crate) fn add_received (&self) { bump( &self.received) }
    pub(crate) fn add_track_update (&self) { bump( &self.track_updates) }
    pub(crate) fn add_flight_plan_update (&self) { bump( &self.flight_plan_updates) }
    pub(crate) fn add_unknown_update (&self) { bump( &self.unknown_updates) }
    pub(crate) fn add_decode_error (&self) { bump( &self.decode_errors) }
    pub(crate) fn add_transport_error (&self) { bump( &self.transport_errors) }
    pub(crate) fn add_reconnect (&self) { bump( &self.reconnects) }

    pub fn snapshot (&self)->StatsSnapshot {
        StatsSnapshot {
            received: get( &self.received),
            track_updates: get( &self.track_updates),
            flight_plan_updates: get( &self.flight_plan_updates),
            unknown_updates: get( &self.unknown_updates),
            decode_errors: get( &self.decode_errors),
            transport_errors: get( &self.transport_errors),
            reconnects: get( &self.reconnects),
        }
    }
}

#[derive(Debug,Clone,Copy,Default,PartialEq,Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub track_updates: u64,
    pub flight_plan_updates: u64,
    pub unknown_updates: u64,
    pub decode_errors: u64,
    pub transport_errors: u64,
    pub reconnects: u64,
}

impl StatsSnapshot {
    /// number of received messages that did not result in an entity update
    pub fn dropped (&self)->u64 { self.unknown_updates + self.decode_errors }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "received: {}, tracks: {}, flight plans: {}, unknown: {}, malformed: {}, transport errors: {}, reconnects: {}",
            self.received, self.track_updates, self.flight_plan_updates, self.unknown_updates,
            self.decode_errors, self.transport_errors, self.reconnects)
    }
}
