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

//! receiver for scope server track and flight plan updates
//!
//! Updates arrive as JSON messages over a websocket (push) or a continuously re-opened http stream
//! (pull). Each message carries a sparse set of changed fields for either a [`Track`] or a [`FlightPlan`],
//! which get merged field by field into the [`EntityStore`] using per-field timestamps. The merged
//! state of a track and its associated flight plan is then projected onto an [`Aircraft`] object owned
//! by the presentation layer ([`AircraftSink`]).

use std::sync::Arc;
use tokio::{select, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug,info,warn,error};

pub mod errors;
pub mod config;
pub mod stats;
pub mod fields;
pub mod update;
pub mod track;
pub mod flight_plan;
pub mod store;
pub mod aircraft;
pub mod transport;

pub use config::{ScopeConfig,load_config};
pub use update::{Update,TrackUpdate,FlightPlanUpdate,decode_update};
pub use track::Track;
pub use flight_plan::FlightPlan;
pub use store::EntityStore;
pub use aircraft::{Aircraft,AircraftList,AircraftSink,LdrParser,parse_ldr_direction};
pub use stats::{ReceiverStats,StatsSnapshot};
pub use transport::{MessageSource,ChannelSource,open_source};

use crate::errors::Result;
use crate::store::{lock,snapshot};
use crate::flight_plan::FlightPlanField;

/// the state that is shared between a [`ScopeReceiver`] and its receive task
pub struct ScopeState {
    store: EntityStore,
    aircraft: Arc<dyn AircraftSink>,
    stats: Arc<ReceiverStats>,
    ldr_parser: LdrParser,
}

impl ScopeState {
    pub fn new (aircraft: Arc<dyn AircraftSink>, ldr_parser: LdrParser)->Self {
        ScopeState { store: EntityStore::new(), aircraft, stats: Arc::new( ReceiverStats::new()), ldr_parser }
    }

    pub fn store (&self)->&EntityStore { &self.store }
    pub fn stats (&self)->StatsSnapshot { self.stats.snapshot() }

    /// decode and process a raw message. Malformed messages and unknown update types are dropped
    /// without touching any entity (they only show up in the stats)
    pub fn process_msg (&self, msg: &str) {
        self.stats.add_received();
        match decode_update( msg) {
            Ok(Some(update)) => self.process_update( &update),
            Ok(None) => {
                self.stats.add_unknown_update();
                debug!("dropping message with unknown update type: {}", msg);
            }
            Err(e) => {
                self.stats.add_decode_error();
                warn!("dropping malformed message ({}): {}", e, msg);
            }
        }
    }

    pub fn process_update (&self, update: &Update) {
        match update {
            Update::Track(u) => self.process_track_update( u),
            Update::FlightPlan(u) => self.process_flight_plan_update( u),
        }
    }

    fn process_track_update (&self, update: &TrackUpdate) {
        self.stats.add_track_update();

        let track_ref = self.store.get_or_create_track( update.guid);
        let track = {
            let mut track = lock( &track_ref);
            track.merge( update);
            track.clone()
        };
        let flight_plan = self.store.associated_flight_plan( &update.guid).map( |fp| snapshot( &fp));

        if let Some(ac) = self.aircraft.get_aircraft( update.guid, true) {
            aircraft::project( &mut lock( &ac), Some(&track), flight_plan.as_ref(), update.timestamp, self.ldr_parser);
        }
    }

    fn process_flight_plan_update (&self, update: &FlightPlanUpdate) {
        self.stats.add_flight_plan_update();

        let fp_ref = self.store.get_or_create_flight_plan( update.guid);
        let (flight_plan, prev_track_id, assoc_applied) = {
            let mut fp = lock( &fp_ref);
            let prev_track_id = fp.associated_track;
            let applied = fp.merge( update);
            (fp.clone(), prev_track_id, applied.contains( &FlightPlanField::AssociatedTrack))
        };

        // associations are only established by updates whose track reference was applied
        let Some(track_id) = flight_plan.associated_track else { return };
        let track_ref = if assoc_applied {
            Some( self.store.associate( flight_plan.id, prev_track_id, track_id))
        } else {
            self.store.track( &track_id)
        };

        // a track only shows the flight plan that associated it last
        if self.store.associated_flight_plan_id( &track_id) != Some(flight_plan.id) {
            debug!("flight plan {} is not the current flight plan of track {}", flight_plan.id, track_id);
            return
        }

        // flight plan updates never create aircraft
        if let Some(ac) = self.aircraft.get_aircraft( track_id, false) {
            let track = track_ref.map( |t| snapshot( &t));
            aircraft::project( &mut lock( &ac), track.as_ref(), Some(&flight_plan), update.timestamp, self.ldr_parser);
        }
    }
}

struct ReceiverTask {
    cancel: CancellationToken,
    join_handle: JoinHandle<()>,
}

/// start/stop control for a background task that reads messages from a [`MessageSource`] and
/// processes them in order. Needs to be used from within a tokio runtime
pub struct ScopeReceiver {
    config: Arc<ScopeConfig>,
    state: Arc<ScopeState>,
    task: Option<ReceiverTask>,
}

impl ScopeReceiver {
    /// a receiver that keeps its aircraft in its own [`AircraftList`]
    pub fn new (config: ScopeConfig)->Self {
        Self::with_sink( config, Arc::new( AircraftList::new()))
    }

    pub fn with_sink (config: ScopeConfig, aircraft: Arc<dyn AircraftSink>)->Self {
        Self::with_components( config, aircraft, parse_ldr_direction)
    }

    pub fn with_components (config: ScopeConfig, aircraft: Arc<dyn AircraftSink>, ldr_parser: LdrParser)->Self {
        let state = Arc::new( ScopeState::new( aircraft, ldr_parser));
        ScopeReceiver { config: Arc::new(config), state, task: None }
    }

    pub fn config (&self)->&ScopeConfig { &self.config }
    pub fn state (&self)->&Arc<ScopeState> { &self.state }
    pub fn stats (&self)->StatsSnapshot { self.state.stats() }

    pub fn is_running (&self)->bool {
        self.task.as_ref().is_some_and( |t| !t.join_handle.is_finished())
    }

    /// start receiving from the configured URL. Returns `Ok(false)` if we are already running.
    /// The only errors reported here are configuration errors (connection problems are handled by the source)
    pub fn start (&mut self)->Result<bool> {
        if self.is_running() {
            warn!("receiver for {} already running", self.config.url);
            return Ok(false)
        }
        let source = open_source( self.config.clone(), self.state.stats.clone())?;
        Ok( self.start_with( source))
    }

    /// start receiving from an explicit source. Returns false if we are already running
    pub fn start_with (&mut self, source: Box<dyn MessageSource>)->bool {
        if self.is_running() {
            warn!("receiver for {} already running", self.config.url);
            return false
        }

        let cancel = CancellationToken::new();
        let join_handle = tokio::spawn( receive_loop( source, self.state.clone(), cancel.clone()));
        self.task = Some( ReceiverTask { cancel, join_handle });
        true
    }

    /// stop the receive task and wait until it has terminated. A message that is already being
    /// processed is completed, a pending read is abandoned
    pub async fn stop (&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
            if let Err(e) = task.join_handle.await {
                error!("receiver task failed: {}", e);
            }
        }
    }

    /// process a single raw message in the context of the caller (e.g. for replay)
    pub fn process_msg (&self, msg: &str) {
        self.state.process_msg( msg)
    }
}

impl Drop for ScopeReceiver {
    fn drop (&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
        }
    }
}

async fn receive_loop (mut source: Box<dyn MessageSource>, state: Arc<ScopeState>, cancel: CancellationToken) {
    info!("receiver started");
    loop {
        let next = select! {
            biased;
            _ = cancel.cancelled() => break,
            next = source.next_msg() => next
        };

        match next {
            Ok(Some(msg)) => state.process_msg( msg.as_str()),
            Ok(None) => {
                info!("update stream terminated");
                break
            }
            Err(e) => { // sources count their own transport errors
                error!("update stream failed: {}", e);
                break
            }
        }
    }
    info!("receiver stopped");
}
