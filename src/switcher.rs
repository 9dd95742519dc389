use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::http::{decode_json, DeviceClient};

/// Atlona 2x1 HDMI switcher (two inputs routed to a single output).
///
/// The device web UI has a login form, but the JSON endpoints used here do
/// not require it; `username` and `password` are carried for callers that
/// keep them alongside the address.
#[derive(Clone)]
pub struct VideoSwitcher2x1 {
    address: String,
    pub username: String,
    pub password: String,
    client: DeviceClient,
}

/// Everything `/aj.html?a=avs` reports about the switcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherState {
    pub login_ur: i64,
    pub login_user: String,
    /// Currently routed input
    pub inp: i64,
    /// Auto switching enabled
    pub asw: i64,
    pub preport: i64,
    /// Auto switch delay
    pub aswtime: i64,
    #[serde(rename = "HDMIAud")]
    pub hdmi_audio: i64,
    #[serde(rename = "HDCPSet")]
    pub hdcp_set: Vec<i64>,
}

/// One of the two switcher inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitcherInput {
    One,
    Two,
}

impl SwitcherInput {
    pub fn code(self) -> u8 {
        match self {
            SwitcherInput::One => 1,
            SwitcherInput::Two => 2,
        }
    }
}

impl fmt::Display for SwitcherInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for SwitcherInput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let input: i64 = s
            .parse()
            .context("failed to convert input from string to int")?;
        match input {
            1 => Ok(SwitcherInput::One),
            2 => Ok(SwitcherInput::Two),
            other => bail!(
                "Invalid Input, the input you sent was {} the valid inputs are 1 or 2",
                other
            ),
        }
    }
}

impl fmt::Debug for VideoSwitcher2x1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSwitcher2x1")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.client.timeout())
            .finish()
    }
}

pub(crate) fn state_url(address: &str) -> String {
    format!("http://{}/aj.html?a=avs", address)
}

pub(crate) fn route_url(address: &str, input: SwitcherInput) -> String {
    format!("http://{}/aj.html?a=command&cmd=x{}AVx1", address, input)
}

impl VideoSwitcher2x1 {
    pub fn new(address: &str, username: &str, password: &str) -> Self {
        Self {
            address: address.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            client: DeviceClient::default(),
        }
    }

    /// Set the deadline for each request made by this driver
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client.set_timeout(timeout);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn get_state(&self) -> Result<SwitcherState> {
        let url = state_url(&self.address);
        debug!(target: "atlona::switcher", "Fetching state from {}", url);

        let body = self.client.get_body(&url)?;
        decode_json(&body).context("error when unmarshalling the response")
    }

    /// Input currently routed to `output`, as the device's numeric code.
    ///
    /// There is only one output, so `output` does not change the request.
    pub fn get_input_by_output(&self, output: &str) -> Result<String> {
        let state = self.get_state()?;
        debug!(
            target: "atlona::switcher",
            "Output {} on {} is showing input {}", output, self.address, state.inp
        );
        Ok(state.inp.to_string())
    }

    /// Route `input` ("1" or "2") to the output. Invalid inputs are rejected
    /// before the device is contacted.
    pub fn set_input_by_output(&self, output: &str, input: &str) -> Result<()> {
        let input: SwitcherInput = input.parse()?;
        let url = route_url(&self.address, input);
        debug!(target: "atlona::switcher", "Routing with {}", url);

        self.client.get_body(&url)?;
        info!(
            target: "atlona::switcher",
            "Switched output {} on {} to input {}", output, self.address, input
        );
        Ok(())
    }
}
