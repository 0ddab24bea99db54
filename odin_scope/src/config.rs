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

use std::{fs, path::Path, time::Duration};
use serde::{Serialize,Deserialize};

use crate::errors::Result;

/// receiver configuration, normally read from a RON file such as
/// ```ron
/// ScopeConfig(
///     url: "wss://scope.example.com/api/updates",
///     username: "user",
///     password: "secret",
///     connect_timeout: (secs: 10, nanos: 0),
///     retry_delay: Some((secs: 1, nanos: 0)),
///     reconnect_delay: None,
///     keep_alive: (secs: 1800, nanos: 0),
///     max_line_len: 1048576,
/// )
/// ```
#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct ScopeConfig {
    pub url: String, // ws(s):// selects the push transport, http(s):// the pull (streaming body) transport
    pub username: String,
    pub password: String,

    pub connect_timeout: Duration,

    // pull transport: delay before re-opening after a failed request or read. None means no retry
    pub retry_delay: Option<Duration>,

    // push transport: delay before reconnecting a dropped websocket. None means the receiver terminates
    pub reconnect_delay: Option<Duration>,

    // push transport: websocket ping interval
    pub keep_alive: Duration,

    // pull transport: lines longer than this are dropped
    pub max_line_len: usize,
}

impl ScopeConfig {
    pub fn new (url: impl ToString, username: impl ToString, password: impl ToString)->Self {
        ScopeConfig {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }
}

impl Default for ScopeConfig {
    fn default()->Self {
        ScopeConfig {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            connect_timeout: Duration::from_secs(10),
            retry_delay: Some( Duration::from_secs(1)),
            reconnect_delay: None,
            keep_alive: Duration::from_secs(30*60),
            max_line_len: 1024*1024,
        }
    }
}

pub fn load_config<P: AsRef<Path>> (path: P)->Result<ScopeConfig> {
    let data = fs::read_to_string( path)?;
    parse_config( data.as_str())
}

pub fn parse_config (src: &str)->Result<ScopeConfig> {
    Ok( ron::from_str( src)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config () {
        let src = r#"ScopeConfig(
            url: "http://localhost:8080/updates",
            username: "usr",
            password: "pw",
            reconnect_delay: Some((secs: 5, nanos: 0)),
        )"#;
        let config = parse_config( src).unwrap();
        assert_eq!( config.url, "http://localhost:8080/updates");
        assert_eq!( config.reconnect_delay, Some( Duration::from_secs(5)));
        assert_eq!( config.retry_delay, Some( Duration::from_secs(1))); // default
        assert_eq!( config.keep_alive, Duration::from_secs(1800));
    }
}
