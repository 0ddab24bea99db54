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

//! per-field timestamp tables used to merge sparse updates into entities
//!
//! Each entity kind has a field identifier enum that indexes a fixed size array of "last set" timestamps.
//! A field value is only replaced if the update carrying it is not older than the update that set the
//! stored value, i.e. the merge is last-write-wins per field (not per message). Note that this assumes
//! each source stamps its own changes monotonically - clock skew between different sources is not corrected.

use std::{fmt, marker::PhantomData};
use chrono::{DateTime,Utc};

/// field identifier enums that can be used to index a [`FieldTimes`] table
pub trait FieldId: Copy + fmt::Debug {
    fn index (self)->usize;
}

/// the freshness side table of an entity. `N` is the number of fields of the `F` enum
#[derive(Clone,PartialEq)]
pub struct FieldTimes<F: FieldId, const N: usize> {
    times: [Option<DateTime<Utc>>; N],
    field: PhantomData<F>,
}

impl<F: FieldId, const N: usize> FieldTimes<F,N> {
    pub fn new ()->Self {
        FieldTimes { times: [None; N], field: PhantomData }
    }

    /// the timestamp of the update that last set `field` (None if it was never set)
    pub fn get (&self, field: F)->Option<DateTime<Utc>> { self.times[field.index()] }

    /// would an update with `timestamp` win for `field`? Unset fields accept everything
    pub fn accepts (&self, field: F, timestamp: DateTime<Utc>)->bool {
        match self.times[field.index()] {
            Some(t) => timestamp >= t,
            None => true
        }
    }

    /// the latest timestamp of any field
    pub fn latest (&self)->Option<DateTime<Utc>> {
        self.times.iter().flatten().max().copied()
    }

    /// merge an optional update value into `slot`. Absent values never touch slot or timestamp.
    /// Returns true if the slot was (re-)set
    pub fn merge<T: Clone> (&mut self, field: F, slot: &mut Option<T>, value: &Option<T>, timestamp: DateTime<Utc>)->bool {
        if let Some(v) = value {
            if self.accepts( field, timestamp) {
                *slot = Some(v.clone());
                self.times[field.index()] = Some(timestamp);
                return true
            }
        }
        false
    }
}

impl<F: FieldId, const N: usize> Default for FieldTimes<F,N> {
    fn default()->Self { Self::new() }
}

impl<F: FieldId, const N: usize> fmt::Debug for FieldTimes<F,N> {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        f.debug_list().entries( self.times.iter().flatten()).finish()
    }
}

/// a value together with the timestamp of the update that set it
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub time: DateTime<Utc>,
}

impl<T> Timed<T> {
    pub fn new (value: T, time: DateTime<Utc>)->Self { Timed { value, time } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug,Clone,Copy)]
    enum TestField { A, B }
    impl FieldId for TestField { fn index (self)->usize { self as usize } }

    fn ts (secs: i64)->DateTime<Utc> { Utc.timestamp_opt( secs, 0).unwrap() }

    #[test]
    fn test_merge_rules () {
        let mut times: FieldTimes<TestField,2> = FieldTimes::new();
        let mut a: Option<i32> = None;

        assert!( times.merge( TestField::A, &mut a, &Some(1), ts(10)));
        assert!( !times.merge( TestField::A, &mut a, &Some(2), ts(5)));
        assert_eq!( a, Some(1));

        assert!( times.merge( TestField::A, &mut a, &Some(3), ts(10))); // equal timestamps win
        assert_eq!( a, Some(3));

        assert!( !times.merge( TestField::A, &mut a, &None, ts(20)));
        assert_eq!( times.get(TestField::A), Some(ts(10)));
        assert_eq!( times.get(TestField::B), None);
        assert_eq!( times.latest(), Some(ts(10)));
    }
}
