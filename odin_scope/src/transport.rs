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

//! transport sessions that turn a push (websocket) or pull (streaming http body) connection into a
//! sequence of raw text messages
//!
//! Sources connect lazily on the first [`MessageSource::next_msg`] call and handle their own reconnects
//! according to the [`ScopeConfig`]. Note that the two transports differ in their defaults: a dropped
//! websocket ends the sequence unless `reconnect_delay` is set, whereas the http transport keeps
//! re-opening the stream unless `retry_delay` is `None`.

use std::{sync::Arc, time::Duration};
use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt, stream::BoxStream};
use memchr::memchr;
use reqwest::Client;
use tokio::{net::TcpStream, select, sync::mpsc, time::{sleep,interval_at,timeout,Instant,Interval,MissedTickBehavior}};
use tokio_tungstenite::{
    connect_async, WebSocketStream, MaybeTlsStream,
    tungstenite::{
        protocol::Message,
        http::header::{AUTHORIZATION,HeaderValue},
        client::IntoClientRequest
    }
};
use tracing::{debug,info,warn};
use url::Url;

use crate::config::ScopeConfig;
use crate::errors::{Result,OdinScopeError};
use crate::stats::ReceiverStats;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// an ordered, restartable sequence of raw messages.
/// `Ok(None)` means the source is exhausted, errors are terminal (sources retry internally)
#[async_trait]
pub trait MessageSource: Send {
    async fn next_msg (&mut self)->Result<Option<String>>;
}

/// create the transport that matches the URL scheme of `config`
pub fn open_source (config: Arc<ScopeConfig>, stats: Arc<ReceiverStats>)->Result<Box<dyn MessageSource>> {
    let url = Url::parse( config.url.as_str())?;
    match url.scheme() {
        "ws" | "wss" => Ok( Box::new( WsSource::new( config, stats))),
        "http" | "https" => Ok( Box::new( HttpStreamSource::new( config, stats)?)),
        other => Err( OdinScopeError::UnsupportedScheme( other.to_string()))
    }
}

fn basic_auth_value (username: &str, password: &str)->String {
    format!("Basic {}", BASE64_STANDARD.encode( format!("{username}:{password}")))
}

/* #region push transport ********************************************************************************/

/// websocket source - each text frame is one message
pub struct WsSource {
    config: Arc<ScopeConfig>,
    stats: Arc<ReceiverStats>,
    ws: Option<WsStream>,
    keep_alive: Option<Interval>, // ping timer of the current connection
}

enum WsEvent {
    Msg(String),
    Skip,
    Dropped,
}

impl WsSource {
    pub fn new (config: Arc<ScopeConfig>, stats: Arc<ReceiverStats>)->Self {
        WsSource { config, stats, ws: None, keep_alive: None }
    }

    async fn connect (config: Arc<ScopeConfig>)->Result<WsStream> {
        let mut request = config.url.as_str().into_client_request()?;
        if !config.username.is_empty() {
            let auth = basic_auth_value( &config.username, &config.password);
            request.headers_mut().insert( AUTHORIZATION, HeaderValue::from_str( auth.as_str())?);
        }

        match timeout( config.connect_timeout, connect_async( request)).await {
            Ok(res) => Ok( res?.0 ),
            Err(_) => Err( OdinScopeError::ConnectTimeout( config.url.clone()))
        }
    }

    /// what to do after we lost (or failed to get) a connection. Returns the reconnect delay if we should try again
    fn reconnect_delay (&mut self)->Option<Duration> {
        self.ws = None;
        self.stats.add_transport_error();
        self.config.reconnect_delay
    }

    async fn read_event (ws: &mut WsStream, keep_alive: &mut Interval)->WsEvent {
        select! {
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => WsEvent::Msg( text.as_str().to_string()),
                Some(Ok(Message::Binary(data))) => match String::from_utf8( data.to_vec()) {
                    Ok(text) => WsEvent::Msg( text),
                    Err(_) => { warn!("ignoring non UTF-8 binary websocket message"); WsEvent::Skip }
                }
                Some(Ok(Message::Close(frame))) => { info!("server closed websocket: {:?}", frame); WsEvent::Dropped }
                Some(Ok(_)) => WsEvent::Skip, // ping, pong, raw frames
                Some(Err(e)) => { warn!("websocket read failed: {}", e); WsEvent::Dropped }
                None => { info!("websocket stream ended"); WsEvent::Dropped }
            },
            _ = keep_alive.tick() => {
                if let Err(e) = ws.send( Message::Ping( Bytes::new())).await {
                    warn!("websocket keep-alive failed: {}", e);
                    WsEvent::Dropped
                } else {
                    WsEvent::Skip
                }
            }
        }
    }
}

#[async_trait]
impl MessageSource for WsSource {
    async fn next_msg (&mut self)->Result<Option<String>> {
        loop {
            if self.ws.is_none() {
                match Self::connect( self.config.clone()).await {
                    Ok(ws) => {
                        info!("connected to {}", self.config.url);
                        self.ws = Some(ws);
                        self.keep_alive = Some( keep_alive_interval( self.config.keep_alive));
                    }
                    Err(e) => {
                        if let Some(delay) = self.reconnect_delay() {
                            warn!("failed to connect to {}: {}, retrying in {:?}", self.config.url, e, delay);
                            sleep(delay).await;
                            self.stats.add_reconnect();
                            continue
                        } else {
                            return Err(e)
                        }
                    }
                }
            }

            let (Some(ws), Some(keep_alive)) = (self.ws.as_mut(), self.keep_alive.as_mut()) else { continue };
            match Self::read_event( ws, keep_alive).await {
                WsEvent::Msg(msg) => return Ok(Some(msg)),
                WsEvent::Skip => {}
                WsEvent::Dropped => {
                    if let Some(delay) = self.reconnect_delay() {
                        info!("reconnecting to {} in {:?}", self.config.url, delay);
                        sleep(delay).await;
                        self.stats.add_reconnect();
                    } else {
                        return Ok(None) // no reconnect configured - this terminates the receiver
                    }
                }
            }
        }
    }
}

fn keep_alive_interval (period: Duration)->Interval {
    let mut iv = interval_at( Instant::now() + period, period);
    iv.set_missed_tick_behavior( MissedTickBehavior::Delay);
    iv
}

/* #endregion push transport */

/* #region pull transport ********************************************************************************/

/// http source that reads a continuous response body - each line is one message.
/// The request is re-opened `retry_delay` after the body ends
pub struct HttpStreamSource {
    config: Arc<ScopeConfig>,
    stats: Arc<ReceiverStats>,
    client: Client,
    body: Option<BoxStream<'static, reqwest::Result<Bytes>>>,
    lines: LineBuffer,
    reopen_delay: Option<Duration>, // pending wait before the next request
    done: bool,
}

impl HttpStreamSource {
    pub fn new (config: Arc<ScopeConfig>, stats: Arc<ReceiverStats>)->Result<Self> {
        let client = Client::builder().connect_timeout( config.connect_timeout).build()?;
        let lines = LineBuffer::new( config.max_line_len);
        Ok( HttpStreamSource { config, stats, client, body: None, lines, reopen_delay: None, done: false } )
    }

    async fn open (client: Client, config: Arc<ScopeConfig>)->Result<BoxStream<'static, reqwest::Result<Bytes>>> {
        let mut request = client.get( config.url.as_str());
        if !config.username.is_empty() {
            request = request.basic_auth( &config.username, Some( &config.password));
        }
        let response = request.send().await?.error_for_status()?;
        info!("opened update stream {}", config.url);
        Ok( response.bytes_stream().boxed() )
    }

    /// transport failure: either returns the error or waits for the configured retry delay
    async fn retry_or_fail (&mut self, e: OdinScopeError)->Result<()> {
        self.body = None;
        self.stats.add_transport_error();
        if let Some(delay) = self.config.retry_delay {
            warn!("update stream {} failed: {}, retrying in {:?}", self.config.url, e, delay);
            sleep(delay).await;
            self.stats.add_reconnect();
            Ok(())
        } else {
            Err(e)
        }
    }
}

#[async_trait]
impl MessageSource for HttpStreamSource {
    async fn next_msg (&mut self)->Result<Option<String>> {
        loop {
            if let Some(line) = self.lines.next_line() { return Ok(Some(line)) }
            if self.done { return Ok(None) }

            if self.body.is_none() {
                if let Some(delay) = self.reopen_delay.take() {
                    sleep(delay).await;
                }
                match Self::open( self.client.clone(), self.config.clone()).await {
                    Ok(body) => self.body = Some(body),
                    Err(e) => { self.retry_or_fail(e).await?; continue }
                }
            }

            let Some(body) = self.body.as_mut() else { continue };
            match body.next().await {
                Some(Ok(data)) => self.lines.push( &data),
                Some(Err(e)) => {
                    self.lines.clear(); // partial line of an aborted read
                    self.retry_or_fail( e.into()).await?;
                }
                None => {
                    self.lines.finish();
                    self.body = None;
                    if let Some(delay) = self.config.retry_delay {
                        debug!("update stream {} ended, re-opening in {:?}", self.config.url, delay);
                        self.reopen_delay = Some(delay); // lines of the ended body are delivered before we wait
                        self.stats.add_reconnect();
                    } else {
                        self.done = true;
                    }
                }
            }
        }
    }
}

/// accumulates body chunks and splits them into non-empty, '\n' terminated lines ('\r\n' is accepted)
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_len: usize,
    discarding: bool, // skip input up to the next '\n' (rest of an overlong line)
}

impl LineBuffer {
    pub fn new (max_len: usize)->Self {
        LineBuffer { buf: Vec::with_capacity(8192), max_len, discarding: false }
    }

    pub fn push (&mut self, mut data: &[u8]) {
        if self.discarding {
            match memchr( b'\n', data) {
                Some(idx) => {
                    self.discarding = false;
                    data = &data[idx+1..];
                }
                None => return
            }
        }
        self.buf.extend_from_slice( data);

        if self.buf.len() > self.max_len && memchr( b'\n', &self.buf).is_none() {
            warn!("dropping {} bytes of unterminated input exceeding max line length", self.buf.len());
            self.buf.clear();
            self.discarding = true;
        }
    }

    pub fn next_line (&mut self)->Option<String> {
        while let Some(idx) = memchr( b'\n', &self.buf) {
            let mut line: Vec<u8> = self.buf.drain( ..=idx).collect();
            line.pop();
            if line.last() == Some(&b'\r') { line.pop(); }

            if line.iter().all( |b| b.is_ascii_whitespace()) { continue }
            if line.len() > self.max_len {
                warn!("dropping line of {} bytes exceeding max line length", line.len());
                continue
            }

            match String::from_utf8( line) {
                Ok(s) => return Some(s),
                Err(_) => warn!("dropping non UTF-8 line")
            }
        }
        None
    }

    /// terminate whatever is left in the buffer as the last line
    pub fn finish (&mut self) {
        self.discarding = false;
        if !self.buf.is_empty() && self.buf.last() != Some(&b'\n') {
            self.buf.push( b'\n');
        }
    }

    pub fn clear (&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    pub fn is_empty (&self)->bool { self.buf.is_empty() }
}

/* #endregion pull transport */

/// in-process source that is fed through a channel (e.g. for replay of recorded messages).
/// The sequence ends once all senders are dropped
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

impl ChannelSource {
    pub fn new (rx: mpsc::Receiver<String>)->Self { ChannelSource { rx } }

    pub fn create (capacity: usize)->(mpsc::Sender<String>, ChannelSource) {
        let (tx,rx) = mpsc::channel( capacity);
        (tx, ChannelSource::new(rx))
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next_msg (&mut self)->Result<Option<String>> {
        Ok( self.rx.recv().await )
    }
}
