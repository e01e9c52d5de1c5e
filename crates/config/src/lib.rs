//! CLI + environment configuration for the `server` and `edge` binaries.
//!
//! Both binaries are parsed with `clap` derive structs whose fields also
//! read from the environment (`#[arg(env = "...")]`), giving the precedence
//! explicit CLI argument > environment variable > documented default. The
//! `clap::Parser` structs are intentionally thin: the parts that are
//! naturally structured (credentials, audio format, channel config) are
//! immediately folded into a plain serde struct (`ServerSettings` /
//! `EdgeSettings`) so the rest of the crate can be unit-tested without
//! going through argument parsing at all.

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use voice_translate_core::{AudioFormat, ChannelConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required value: {0}")]
    Missing(&'static str),
}

/// Credentials for one cloud provider (STT, translate, or TTS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub key: String,
    pub region: String,
    /// Override for the provider's base URL/endpoint; `None` means "use the
    /// adapter's documented default for `region`".
    pub endpoint: Option<String>,
}

/// Server-side CLI surface (§6 "Server command surface").
#[derive(Debug, Parser)]
#[command(name = "voice-translate-server", version, about)]
pub struct ServerArgs {
    #[arg(long, env = "VOICE_TRANSLATE_BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    #[arg(long, env = "VOICE_TRANSLATE_BIND_PORT")]
    pub bind_port: u16,

    /// Human-readable channel label, e.g. "ES" or "EN".
    #[arg(long, env = "VOICE_TRANSLATE_CHANNEL")]
    pub channel: String,

    /// BCP-47 source locale, e.g. "es-ES".
    #[arg(long, env = "VOICE_TRANSLATE_SOURCE_LOCALE")]
    pub source_locale: String,

    /// Target language primary tag, e.g. "en".
    #[arg(long, env = "VOICE_TRANSLATE_TARGET_LANG")]
    pub target_lang: String,

    /// Synthesis voice identifier understood by the TTS provider.
    #[arg(long, env = "VOICE_TRANSLATE_VOICE")]
    pub voice: String,

    #[arg(long, env = "VOICE_TRANSLATE_SAMPLE_RATE", default_value_t = 16_000)]
    pub sample_rate: u32,

    #[arg(long, env = "VOICE_TRANSLATE_CHANNELS", default_value_t = 1)]
    pub channels: u16,

    #[arg(long, env = "VOICE_TRANSLATE_CHUNK_MS", default_value_t = 20)]
    pub chunk_ms: u32,

    #[arg(long, env = "VOICE_TRANSLATE_STT_KEY")]
    pub stt_key: Option<String>,

    #[arg(long, env = "VOICE_TRANSLATE_STT_REGION")]
    pub stt_region: Option<String>,

    #[arg(long, env = "VOICE_TRANSLATE_STT_ENDPOINT")]
    pub stt_endpoint: Option<String>,

    #[arg(long, env = "VOICE_TRANSLATE_TRANSLATE_KEY")]
    pub translate_key: Option<String>,

    #[arg(long, env = "VOICE_TRANSLATE_TRANSLATE_REGION")]
    pub translate_region: Option<String>,

    #[arg(
        long,
        env = "VOICE_TRANSLATE_TRANSLATE_ENDPOINT",
        default_value = "https://api.cognitive.microsofttranslator.com"
    )]
    pub translate_endpoint: String,

    #[arg(long, env = "VOICE_TRANSLATE_TTS_KEY")]
    pub tts_key: Option<String>,

    #[arg(long, env = "VOICE_TRANSLATE_TTS_REGION")]
    pub tts_region: Option<String>,

    #[arg(long, env = "VOICE_TRANSLATE_TTS_ENDPOINT")]
    pub tts_endpoint: Option<String>,

    /// Transport heartbeat timeout in seconds (§4.2, §9 original_source note).
    #[arg(long, env = "VOICE_TRANSLATE_HEARTBEAT_TIMEOUT_SECS", default_value_t = 20)]
    pub heartbeat_timeout_secs: u64,

    /// Maximum inbound websocket frame size in bytes (§9, carried from the
    /// Python original's `max_size=50_000_000`).
    #[arg(long, env = "VOICE_TRANSLATE_MAX_FRAME_BYTES", default_value_t = 50_000_000)]
    pub max_frame_bytes: usize,

    #[arg(long, env = "VOICE_TRANSLATE_LOG_JSON")]
    pub log_json: bool,
}

/// The structured parts of `ServerArgs`, validated and ready to hand to the
/// session layer. Built once at startup via [`ServerSettings::try_from`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_host: String,
    pub bind_port: u16,
    pub channel: ChannelConfig,
    pub stt: ProviderCredentials,
    pub translate: ProviderCredentials,
    pub tts: ProviderCredentials,
    pub chunk_ms: u32,
    pub heartbeat_timeout_secs: u64,
    pub max_frame_bytes: usize,
    pub log_json: bool,
}

impl TryFrom<ServerArgs> for ServerSettings {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let stt = ProviderCredentials {
            key: args.stt_key.ok_or(ConfigError::Missing("stt-key"))?,
            region: args.stt_region.ok_or(ConfigError::Missing("stt-region"))?,
            endpoint: args.stt_endpoint,
        };
        let translate = ProviderCredentials {
            key: args
                .translate_key
                .ok_or(ConfigError::Missing("translate-key"))?,
            region: args
                .translate_region
                .ok_or(ConfigError::Missing("translate-region"))?,
            endpoint: Some(args.translate_endpoint),
        };
        let tts = ProviderCredentials {
            key: args.tts_key.ok_or(ConfigError::Missing("tts-key"))?,
            region: args.tts_region.ok_or(ConfigError::Missing("tts-region"))?,
            endpoint: args.tts_endpoint,
        };

        Ok(Self {
            bind_host: args.bind_host,
            bind_port: args.bind_port,
            channel: ChannelConfig {
                channel: args.channel,
                source_locale: args.source_locale,
                target_lang: args.target_lang,
                voice: args.voice,
                audio_format: AudioFormat {
                    sample_rate: args.sample_rate,
                    bits_per_sample: 16,
                    channels: args.channels,
                },
            },
            stt,
            translate,
            tts,
            chunk_ms: args.chunk_ms,
            heartbeat_timeout_secs: args.heartbeat_timeout_secs,
            max_frame_bytes: args.max_frame_bytes,
            log_json: args.log_json,
        })
    }
}

/// Edge-side CLI surface (§6 "Edge command surface").
#[derive(Debug, Parser)]
#[command(name = "voice-translate-edge", version, about)]
pub struct EdgeArgs {
    /// `ws://<host>:<port>` of the matching channel server.
    #[arg(long, env = "VOICE_TRANSLATE_URL")]
    pub url: String,

    /// Opaque capture device identifier passed to `cpal`'s device
    /// enumeration; "default" selects the host's default input device.
    #[arg(long, env = "VOICE_TRANSLATE_CAPTURE_DEVICE", default_value = "default")]
    pub capture_device: String,

    #[arg(long, env = "VOICE_TRANSLATE_PLAYBACK_DEVICE", default_value = "default")]
    pub playback_device: String,

    #[arg(long, env = "VOICE_TRANSLATE_CHANNEL", default_value = "")]
    pub channel: String,

    #[arg(long, env = "VOICE_TRANSLATE_SAMPLE_RATE", default_value_t = 16_000)]
    pub sample_rate: u32,

    #[arg(long, env = "VOICE_TRANSLATE_CHANNELS", default_value_t = 1)]
    pub channels: u16,

    #[arg(long, env = "VOICE_TRANSLATE_CHUNK_MS", default_value_t = 20)]
    pub chunk_ms: u32,

    #[arg(long, env = "VOICE_TRANSLATE_BYTES_PER_SAMPLE", default_value_t = 2)]
    pub bytes_per_sample: u16,

    #[arg(long, env = "VOICE_TRANSLATE_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSettings {
    pub url: String,
    pub capture_device: String,
    pub playback_device: String,
    pub channel: String,
    pub audio_format: AudioFormat,
    pub chunk_ms: u32,
    pub log_json: bool,
}

impl From<EdgeArgs> for EdgeSettings {
    fn from(args: EdgeArgs) -> Self {
        Self {
            url: args.url,
            capture_device: args.capture_device,
            playback_device: args.playback_device,
            channel: args.channel,
            audio_format: AudioFormat {
                sample_rate: args.sample_rate,
                bits_per_sample: args.bytes_per_sample * 8,
                channels: args.channels,
            },
            chunk_ms: args.chunk_ms,
            log_json: args.log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> ServerArgs {
        ServerArgs::parse_from([
            "voice-translate-server",
            "--bind-port",
            "8080",
            "--channel",
            "ES",
            "--source-locale",
            "es-ES",
            "--target-lang",
            "en",
            "--voice",
            "en-US-JennyNeural",
            "--stt-key",
            "k1",
            "--stt-region",
            "eastus",
            "--translate-key",
            "k2",
            "--translate-region",
            "eastus",
            "--tts-key",
            "k3",
            "--tts-region",
            "eastus",
        ])
    }

    #[test]
    fn full_args_produce_valid_settings() {
        let settings = ServerSettings::try_from(base_args()).unwrap();
        assert_eq!(settings.channel.channel, "ES");
        assert_eq!(settings.channel.audio_format.sample_rate, 16_000);
        assert_eq!(settings.stt.region, "eastus");
    }

    #[test]
    fn missing_credential_is_a_startup_error() {
        let mut args = base_args();
        args.tts_key = None;
        let err = ServerSettings::try_from(args).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("tts-key")));
    }

    #[test]
    fn edge_settings_default_chunk_matches_spec() {
        let args = EdgeArgs::parse_from(["voice-translate-edge", "--url", "ws://localhost:9001"]);
        let settings = EdgeSettings::from(args);
        assert_eq!(settings.audio_format.chunk_bytes(settings.chunk_ms), 640);
    }
}
