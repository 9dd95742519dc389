use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::http::{decode_json, is_malformed, read_body, DeviceClient};

/// Atlona AT-GAIN-60 60 watt amplifier
#[derive(Debug, Clone)]
pub struct Amp60 {
    address: String,
    client: DeviceClient,
}

/// Status block returned by `devicestatus_get`. The device keys every field
/// by a numeric parameter code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmpStatus {
    #[serde(rename = "101", default, deserialize_with = "lenient_string")]
    pub model: String,
    #[serde(rename = "102", default, deserialize_with = "lenient_string")]
    pub firmware: String,
    #[serde(rename = "103", default, deserialize_with = "lenient_string")]
    pub mac_address: String,
    #[serde(rename = "104", default, deserialize_with = "lenient_string")]
    pub serial_number: String,
    #[serde(rename = "105", default, deserialize_with = "lenient_string")]
    pub operating_time: String,
}

/// Audio block returned by `deviceaudio_get`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmpAudio {
    #[serde(
        rename = "608",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_string"
    )]
    pub volume: Option<String>,
    #[serde(
        rename = "609",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_string"
    )]
    pub muted: Option<String>,
}

/// Firmware revisions disagree on whether values are quoted, so accept both.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Build a request URL. `r` only exists to keep caches out of the way.
pub(crate) fn amp_url(address: &str, endpoint: &str, r: f32) -> String {
    format!("http://{}/?action={}&r={}", address, endpoint, r)
}

fn cache_buster() -> f32 {
    rand::random::<f32>()
}

impl Amp60 {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
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

    /// Issue one command and return whatever body came back.
    ///
    /// The amplifier answers some commands with a response that is not valid
    /// HTTP. Those, and URLs that cannot be built, come back as an empty body
    /// instead of an error.
    fn send_req(&self, endpoint: &str) -> Result<Vec<u8>> {
        let url = amp_url(&self.address, endpoint, cache_buster());
        debug!(target: "atlona::amp", "Sending {}", url);

        let response = match self.client.send(&url) {
            Ok(response) => response,
            Err(e) if is_malformed(&e) => {
                warn!(target: "atlona::amp", "Ignoring malformed exchange with {}: {}", self.address, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e).context("unable to perform request"),
        };

        let body = read_body(response).context("unable to read resp body")?;
        debug!(
            target: "atlona::amp",
            "Response from {}: {}", self.address, String::from_utf8_lossy(&body)
        );
        Ok(body)
    }

    fn get_audio(&self) -> Result<AmpAudio> {
        let body = self.send_req("deviceaudio_get")?;
        decode_json(&body).context("unable to unmarshal into AmpAudio")
    }

    pub fn get_info(&self) -> Result<AmpStatus> {
        let body = self.send_req("devicestatus_get").context("unable to get info")?;
        decode_json(&body).context("unable to unmarshal into AmpStatus")
    }

    /// Current volume for each of `blocks`.
    ///
    /// The amp has a single audio block, so one reading answers for all of
    /// them.
    pub fn get_volumes(&self, blocks: &[String]) -> Result<BTreeMap<String, i32>> {
        if blocks.is_empty() {
            return Ok(BTreeMap::new());
        }

        let audio = self.get_audio().context("unable to get volume")?;
        let raw = audio.volume.unwrap_or_default();
        let volume: i32 = raw
            .trim()
            .parse()
            .with_context(|| format!("error converting volume {:?} to int", raw))?;

        Ok(blocks.iter().map(|b| (b.clone(), volume)).collect())
    }

    pub fn get_mutes(&self, blocks: &[String]) -> Result<BTreeMap<String, bool>> {
        if blocks.is_empty() {
            return Ok(BTreeMap::new());
        }

        let audio = self.get_audio().context("unable to get muted")?;
        let muted = audio.muted.as_deref() == Some("1");

        Ok(blocks.iter().map(|b| (b.clone(), muted)).collect())
    }

    pub fn set_volume(&self, block: &str, volume: i32) -> Result<()> {
        self.send_req(&format!("deviceaudio_set&608={}", volume))
            .context("unable to set volume")?;
        info!(target: "atlona::amp", "Set volume on {} block {} to {}", self.address, block, volume);
        Ok(())
    }

    pub fn set_mute(&self, block: &str, muted: bool) -> Result<()> {
        let flag = if muted { "1" } else { "0" };
        self.send_req(&format!("deviceaudio_set&609={}", flag))
            .context("unable to set muted")?;
        info!(target: "atlona::amp", "Set mute on {} block {} to {}", self.address, block, muted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amp_url() {
        assert_eq!(
            amp_url("10.1.1.20", "devicestatus_get", 0.5),
            "http://10.1.1.20/?action=devicestatus_get&r=0.5"
        );
        assert_eq!(
            amp_url("10.1.1.20", "deviceaudio_set&609=1", 0.25),
            "http://10.1.1.20/?action=deviceaudio_set&609=1&r=0.25"
        );
    }

    #[test]
    fn test_cache_buster_range() {
        for _ in 0..100 {
            let r = cache_buster();
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn test_status_decodes_parameter_codes() {
        let payload = r#"{"101":"AT-GAIN-60","102":"1.0.12","103":"B8:98:B0:00:11:22",
            "104":"2094X0001","105":"12:04:33"}"#;
        let status: AmpStatus = serde_json::from_str(payload).unwrap();
        assert_eq!(status.model, "AT-GAIN-60");
        assert_eq!(status.firmware, "1.0.12");
        assert_eq!(status.mac_address, "B8:98:B0:00:11:22");
        assert_eq!(status.serial_number, "2094X0001");
        assert_eq!(status.operating_time, "12:04:33");
    }

    #[test]
    fn test_audio_accepts_quoted_and_bare_values() {
        let quoted: AmpAudio = serde_json::from_str(r#"{"608":"-12","609":"1"}"#).unwrap();
        assert_eq!(quoted.volume.as_deref(), Some("-12"));
        assert_eq!(quoted.muted.as_deref(), Some("1"));

        let bare: AmpAudio = serde_json::from_str(r#"{"608":35,"609":0}"#).unwrap();
        assert_eq!(bare.volume.as_deref(), Some("35"));
        assert_eq!(bare.muted.as_deref(), Some("0"));
    }

    #[test]
    fn test_audio_missing_fields() {
        let audio: AmpAudio = serde_json::from_str("{}").unwrap();
        assert_eq!(audio, AmpAudio::default());
        assert_eq!(serde_json::to_string(&audio).unwrap(), "{}");
    }

    #[test]
    fn test_empty_blocks_skip_the_device() {
        // Nothing listens on this address; an empty block list must not try.
        let amp = Amp60::new("127.0.0.1:9").with_timeout(Duration::from_millis(100));
        assert!(amp.get_volumes(&[]).unwrap().is_empty());
        assert!(amp.get_mutes(&[]).unwrap().is_empty());
    }
}
