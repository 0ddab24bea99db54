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

use std::sync::Arc;
use chrono::{DateTime,TimeZone,Utc};
use uuid::Uuid;
use odin_scope::{
    AircraftList, ScopeState, Track, FlightPlan, TrackUpdate, FlightPlanUpdate, Update, EntityStore, parse_ldr_direction,
    track::TrackField,
    flight_plan::FlightPlanField,
    update::{Altitude,AltitudeType,GeoPos,LdrDirection},
};

const T1: Uuid = Uuid::from_u128(0x1001);
const T2: Uuid = Uuid::from_u128(0x1002);
const F1: Uuid = Uuid::from_u128(0x2001);

fn ts (secs: i64)->DateTime<Utc> { Utc.timestamp_opt( 1_750_000_000 + secs, 0).unwrap() }

fn alt (value: i32)->Option<Altitude> { Some( Altitude { value, altitude_type: AltitudeType::Pressure }) }

fn altitude_update (id: Uuid, secs: i64, value: i32)->TrackUpdate {
    let mut u = TrackUpdate::new( id, ts(secs));
    u.altitude = alt(value);
    u
}

fn new_state ()->(Arc<AircraftList>, ScopeState) {
    let aircraft = Arc::new( AircraftList::new());
    let state = ScopeState::new( aircraft.clone(), parse_ldr_direction);
    (aircraft, state)
}

#[test]
fn test_older_update_rejected () {
    let mut track = Track::new( T1);
    track.merge( &altitude_update( T1, 10, 350));
    let applied = track.merge( &altitude_update( T1, 5, 370));

    assert!( applied.is_empty());
    assert_eq!( track.altitude.map( |a| a.value), Some(350));
    assert_eq!( track.field_time( TrackField::Altitude), Some(ts(10)));
}

#[test]
fn test_arrival_order_independence () {
    let updates = [ altitude_update( T1, 3, 300), altitude_update( T1, 7, 700), altitude_update( T1, 5, 500) ];
    let orders = [ [0,1,2], [0,2,1], [1,0,2], [1,2,0], [2,0,1], [2,1,0] ];

    for order in orders {
        let mut track = Track::new( T1);
        for i in order { track.merge( &updates[i]); }
        assert_eq!( track.altitude.map( |a| a.value), Some(700), "order {order:?}");
        assert_eq!( track.field_time( TrackField::Altitude), Some(ts(7)));
    }
}

#[test]
fn test_idempotent_merge () {
    let mut u = TrackUpdate::new( T1, ts(1));
    u.callsign = Some("AAL123".into());
    u.ground_speed = Some(250);
    u.location = Some( GeoPos { latitude: 37.62, longitude: -122.38 });

    let mut once = Track::new( T1);
    once.merge( &u);

    let mut twice = once.clone();
    let applied = twice.merge( &u);

    assert_eq!( once, twice);
    assert_eq!( applied.len(), 3); // equal timestamps are applied again, the values just don't differ
}

#[test]
fn test_absent_fields_untouched () {
    let mut track = Track::new( T1);
    let mut u = TrackUpdate::new( T1, ts(1));
    u.squawk = Some("4521".into());
    u.vertical_rate = Some(-500);
    track.merge( &u);

    let mut u = TrackUpdate::new( T1, ts(20));
    u.ground_speed = Some(180);
    let applied = track.merge( &u);

    assert_eq!( applied, vec![TrackField::GroundSpeed]);
    assert_eq!( track.squawk.as_deref(), Some("4521"));
    assert_eq!( track.field_time( TrackField::Squawk), Some(ts(1)));
    assert_eq!( track.vertical_rate, Some(-500));
    assert_eq!( track.field_time( TrackField::VerticalRate), Some(ts(1)));
    assert_eq!( track.field_time( TrackField::Callsign), None);
}

#[test]
fn test_merge_is_per_field () {
    let mut track = Track::new( T1);

    let mut a = altitude_update( T1, 10, 350);
    a.ground_speed = Some(420);
    track.merge( &a);

    let mut b = altitude_update( T1, 5, 370);
    b.callsign = Some("UAL9".into());
    let applied = track.merge( &b);

    assert_eq!( applied, vec![TrackField::Callsign]);
    assert_eq!( track.altitude.map( |a| a.value), Some(350));
    assert_eq!( track.callsign.as_deref(), Some("UAL9"));
    assert_eq!( track.ground_speed, Some(420));
}

#[test]
fn test_flight_plan_merge () {
    let mut fp = FlightPlan::new( F1);

    let mut u = FlightPlanUpdate::new( F1, ts(10));
    u.scratchpad1 = Some("RV".into());
    u.ldr_direction = Some( LdrDirection::NE);
    fp.merge( &u);

    let mut u = FlightPlanUpdate::new( F1, ts(8));
    u.scratchpad1 = Some("ILS".into());
    u.destination = Some("KSFO".into());
    let applied = fp.merge( &u);

    assert_eq!( applied, vec![FlightPlanField::Destination]);
    assert_eq!( fp.scratchpad1.as_deref(), Some("RV"));
    assert_eq!( fp.destination.as_deref(), Some("KSFO"));
    assert_eq!( fp.ldr_direction, Some( LdrDirection::NE));
}

#[test]
fn test_flight_plan_fields_projected () {
    let (aircraft, state) = new_state();

    let mut fpu = FlightPlanUpdate::new( F1, ts(1));
    fpu.callsign = Some("SWA214".into());
    fpu.aircraft_type = Some("B738".into());
    fpu.destination = Some("KOAK".into());
    fpu.owner = Some("1R".into());
    fpu.ldr_direction = Some( LdrDirection::SW);
    fpu.associated_track_guid = Some(T1);
    state.process_update( &Update::FlightPlan( fpu));

    assert!( aircraft.get( &T1).is_none()); // flight plan updates do not create aircraft
    assert_eq!( state.store().associated_flight_plan_id( &T1), Some(F1));

    let mut tu = altitude_update( T1, 2, 120);
    tu.callsign = Some("SWA214".into());
    state.process_update( &Update::Track( tu));

    let ac = aircraft.get( &T1).expect("no aircraft for track");
    assert_eq!( ac.flight_plan_callsign.as_deref(), Some("SWA214"));
    assert_eq!( ac.aircraft_type.as_deref(), Some("B738"));
    assert_eq!( ac.destination.as_deref(), Some("KOAK"));
    assert_eq!( ac.position_ind.as_deref(), Some("1R"));
    assert_eq!( ac.ldr_direction, parse_ldr_direction("SW"));
    assert_eq!( ac.altitude.map( |a| a.value), Some(120));
    assert_eq!( ac.last_message_time, Some(ts(2)));
}

#[test]
fn test_flight_plan_update_changes_existing_aircraft () {
    let (aircraft, state) = new_state();
    state.process_update( &Update::Track( altitude_update( T1, 1, 80)));

    let mut fpu = FlightPlanUpdate::new( F1, ts(3));
    fpu.scratchpad1 = Some("HLD".into());
    fpu.associated_track_guid = Some(T1);
    state.process_update( &Update::FlightPlan( fpu));

    let ac = aircraft.get( &T1).unwrap();
    assert_eq!( ac.scratchpad.as_deref(), Some("HLD"));
    assert_eq!( ac.altitude.map( |a| a.value), Some(80)); // track fields are carried along
    assert_eq!( ac.last_message_time, Some(ts(3)));

    // association is kept if later updates omit it
    let mut fpu = FlightPlanUpdate::new( F1, ts(4));
    fpu.scratchpad2 = Some("25L".into());
    state.process_update( &Update::FlightPlan( fpu));

    let ac = aircraft.get( &T1).unwrap();
    assert_eq!( ac.scratchpad2.as_deref(), Some("25L"));
    assert_eq!( state.store().associated_flight_plan_id( &T1), Some(F1));
}

#[test]
fn test_reassociation () {
    let (_aircraft, state) = new_state();

    let mut fpu = FlightPlanUpdate::new( F1, ts(10));
    fpu.associated_track_guid = Some(T1);
    state.process_update( &Update::FlightPlan( fpu));

    let mut stale = FlightPlanUpdate::new( F1, ts(5));
    stale.associated_track_guid = Some(T2);
    state.process_update( &Update::FlightPlan( stale));
    assert_eq!( state.store().associated_flight_plan_id( &T1), Some(F1));
    assert_eq!( state.store().associated_flight_plan_id( &T2), None);

    let mut fpu = FlightPlanUpdate::new( F1, ts(20));
    fpu.associated_track_guid = Some(T2);
    state.process_update( &Update::FlightPlan( fpu));
    assert_eq!( state.store().associated_flight_plan_id( &T1), None);
    assert_eq!( state.store().associated_flight_plan_id( &T2), Some(F1));
    assert_eq!( state.store().n_tracks(), 2); // associated tracks are created on demand
}

#[test]
fn test_last_message_time_monotonic () {
    let (aircraft, state) = new_state();
    let mut fpu = FlightPlanUpdate::new( F1, ts(0));
    fpu.associated_track_guid = Some(T1);
    state.process_update( &Update::FlightPlan( fpu));

    let mut max_seen = None;
    for (i,secs) in [10, 4, 25, 25, 3, 30, 12].into_iter().enumerate() {
        let update = if i % 2 == 0 {
            Update::Track( altitude_update( T1, secs, 100 + secs as i32))
        } else {
            let mut u = FlightPlanUpdate::new( F1, ts(secs));
            u.requested_altitude = Some(secs as i32);
            Update::FlightPlan( u)
        };
        state.process_update( &update);

        let lmt = aircraft.get( &T1).unwrap().last_message_time;
        assert!( lmt >= max_seen, "last message time went backwards at step {i}");
        max_seen = lmt;
    }
    assert_eq!( max_seen, Some(ts(30)));
}

#[test]
fn test_timed_kinematics () {
    let (aircraft, state) = new_state();

    let mut u = TrackUpdate::new( T1, ts(10));
    u.ground_track = Some(270);
    u.location = Some( GeoPos { latitude: 37.7, longitude: -122.2 });
    state.process_update( &Update::Track( u));

    let mut u = TrackUpdate::new( T1, ts(12));
    u.ground_track = Some(275);
    state.process_update( &Update::Track( u));

    let ac = aircraft.get( &T1).unwrap();
    let hdg = ac.track.unwrap();
    assert_eq!( (hdg.value, hdg.time), (275, ts(12)));
    let loc = ac.location.unwrap();
    assert_eq!( loc.time, ts(10)); // location was not refreshed by the second update
    assert_eq!( ac.last_message_time, Some(ts(12)));
}

#[test]
fn test_concurrent_get_or_create () {
    let store = EntityStore::new();

    let tracks: Vec<_> = std::thread::scope( |s| {
        let handles: Vec<_> = (0..8).map( |_| s.spawn( || store.get_or_create_track( T1))).collect();
        handles.into_iter().map( |h| h.join().unwrap()).collect()
    });

    assert_eq!( store.n_tracks(), 1);
    assert!( tracks.iter().all( |t| Arc::ptr_eq( t, &tracks[0])));
}

fn flight_plan_update (id: Uuid, secs: i64, track_id: Option<Uuid>, scratchpad: &str)->FlightPlanUpdate {
    let mut u = FlightPlanUpdate::new( id, ts(secs));
    u.scratchpad1 = Some(scratchpad.into());
    u.associated_track_guid = track_id;
    u
}

#[test]
fn test_superseded_flight_plan_not_projected () {
    const F2: Uuid = Uuid::from_u128(0x2002);
    let (aircraft, state) = new_state();

    state.process_update( &Update::FlightPlan( flight_plan_update( F1, 1, Some(T1), "A")));
    state.process_update( &Update::Track( altitude_update( T1, 2, 90)));
    state.process_update( &Update::FlightPlan( flight_plan_update( F2, 3, Some(T1), "B")));
    assert_eq!( state.store().associated_flight_plan_id( &T1), Some(F2));
    assert_eq!( aircraft.get( &T1).unwrap().scratchpad.as_deref(), Some("B"));

    // F1 still refers to T1 but is no longer its flight plan
    let mut u = flight_plan_update( F1, 4, None, "A2");
    u.destination = Some("KXXX".into());
    state.process_update( &Update::FlightPlan( u));

    let ac = aircraft.get( &T1).unwrap();
    assert_eq!( ac.scratchpad.as_deref(), Some("B"));
    assert_eq!( ac.destination, None);
    assert_eq!( state.store().associated_flight_plan_id( &T1), Some(F2));

    let f1 = state.store().flight_plan( &F1).unwrap();
    assert_eq!( f1.lock().unwrap().scratchpad1.as_deref(), Some("A2")); // the flight plan itself is updated

    // a stale association of F1 does not take T1 back either
    state.process_update( &Update::FlightPlan( flight_plan_update( F1, 0, Some(T1), "A0")));
    assert_eq!( state.store().associated_flight_plan_id( &T1), Some(F2));
    assert_eq!( aircraft.get( &T1).unwrap().scratchpad.as_deref(), Some("B"));
}
