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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,OdinScopeError>;

#[derive(Error,Debug)]
pub enum OdinScopeError {

    #[error("parse error {0}")]
    ParseError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("config error {0}")]
    ConfigError( #[from] ron::error::SpannedError),

    #[error("invalid URL {0}")]
    UrlError( #[from] url::ParseError),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("websocket error {0}")]
    WsError( #[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid header value {0}")]
    InvalidHeaderError( #[from] tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue),

    #[error("unsupported URL scheme '{0}' (expected ws, wss, http or https)")]
    UnsupportedScheme(String),

    #[error("connect to {0} timed out")]
    ConnectTimeout(String),
}

macro_rules! parse_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        OdinScopeError::ParseError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use parse_error;
