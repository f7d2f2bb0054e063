//! # Audio Quality Diagnostics
//!
//! Read-only view of the selected audio track, used for logging and for the
//! `tracks_changed` event. Nothing here influences playback.

use std::fmt;

use bridge_traits::{engine::PcmEncoding, TrackFormat, TrackGroup};
use core_runtime::events::ControlEvent;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// CD sample rate; anything below it suggests resampling somewhere.
pub const CD_SAMPLE_RATE: u32 = 44_100;

/// Codec of the selected audio track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    /// Raw PCM (WAV/AIFF payloads).
    Pcm,
    Alac,
    /// Dolby and other passthrough formats, keyed by MIME type.
    Other(String),
    Unknown,
}

impl AudioCodec {
    pub fn from_mime(mime: Option<&str>) -> Self {
        let Some(mime) = mime else {
            return AudioCodec::Unknown;
        };
        match mime.to_ascii_lowercase().as_str() {
            "audio/mpeg" | "audio/mp3" | "audio/mpeg-l2" => AudioCodec::Mp3,
            "audio/mp4a-latm" | "audio/aac" => AudioCodec::Aac,
            "audio/flac" | "audio/x-flac" => AudioCodec::Flac,
            "audio/vorbis" => AudioCodec::Vorbis,
            "audio/opus" => AudioCodec::Opus,
            "audio/raw" | "audio/wav" | "audio/x-wav" => AudioCodec::Pcm,
            "audio/alac" => AudioCodec::Alac,
            "" => AudioCodec::Unknown,
            other => AudioCodec::Other(other.to_string()),
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Pcm | AudioCodec::Alac)
    }

    pub fn label(&self) -> &str {
        match self {
            AudioCodec::Mp3 => "MP3",
            AudioCodec::Aac => "AAC",
            AudioCodec::Flac => "FLAC",
            AudioCodec::Vorbis => "Vorbis",
            AudioCodec::Opus => "Opus",
            AudioCodec::Pcm => "PCM",
            AudioCodec::Alac => "ALAC",
            AudioCodec::Other(mime) => mime.as_str(),
            AudioCodec::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sample-rate tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low,
    CdQuality,
    /// 48 kHz and up.
    HiRes48,
    /// 96 kHz and up.
    HiRes96,
}

impl QualityTier {
    pub fn from_sample_rate(sample_rate: u32) -> Self {
        match sample_rate {
            r if r >= 96_000 => QualityTier::HiRes96,
            r if r >= 48_000 => QualityTier::HiRes48,
            r if r >= CD_SAMPLE_RATE => QualityTier::CdQuality,
            _ => QualityTier::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::CdQuality => "cd_quality",
            QualityTier::HiRes48 => "hi_res_48",
            QualityTier::HiRes96 => "hi_res_96",
        }
    }

    pub fn is_hi_res(&self) -> bool {
        *self >= QualityTier::HiRes48
    }
}

/// Parameters of the currently selected audio track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioQuality {
    pub codec: AudioCodec,
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u8>,
    pub float_samples: bool,
    pub channels: Option<u16>,
    /// Bits per second.
    pub bitrate: Option<u32>,
    pub container: Option<String>,
    pub format_id: Option<String>,
}

impl AudioQuality {
    pub fn from_format(format: &TrackFormat) -> Self {
        let (bit_depth, float_samples) = match format.pcm_encoding {
            Some(PcmEncoding::Pcm16) => (Some(16), false),
            Some(PcmEncoding::Pcm24) => (Some(24), false),
            Some(PcmEncoding::Pcm32) => (Some(32), false),
            Some(PcmEncoding::Float) => (Some(32), true),
            Some(PcmEncoding::Other(_)) | None => (None, false),
        };

        Self {
            codec: AudioCodec::from_mime(format.sample_mime_type.as_deref()),
            sample_rate: format.sample_rate.filter(|rate| *rate > 0),
            bit_depth,
            float_samples,
            channels: format.channel_count.filter(|count| *count > 0),
            bitrate: format.bitrate.filter(|rate| *rate > 0),
            container: format.container_mime_type.clone(),
            format_id: format.id.clone(),
        }
    }

    /// Quality of the first selected track of the first selected audio group.
    pub fn from_tracks(groups: &[TrackGroup]) -> Option<Self> {
        groups
            .iter()
            .flat_map(|group| group.selected_audio_formats())
            .next()
            .map(Self::from_format)
    }

    pub fn tier(&self) -> Option<QualityTier> {
        self.sample_rate.map(QualityTier::from_sample_rate)
    }

    pub fn below_cd_quality(&self) -> bool {
        matches!(self.sample_rate, Some(rate) if rate < CD_SAMPLE_RATE)
    }

    pub fn to_event(&self) -> ControlEvent {
        ControlEvent::TracksChanged {
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            channels: self.channels,
            codec: Some(self.codec.label().to_string()),
            tier: self.tier().map(|tier| tier.as_str().to_string()),
        }
    }
}

/// `tracks_changed` for a track set with no selected audio track.
pub fn empty_tracks_event() -> ControlEvent {
    ControlEvent::TracksChanged {
        sample_rate: None,
        bit_depth: None,
        channels: None,
        codec: None,
        tier: None,
    }
}

/// Log the selected audio format. `context` names the moment
/// ("tracks changed", "playback started", "before seek").
pub fn log_audio_quality(context: &str, quality: Option<&AudioQuality>) {
    let Some(quality) = quality else {
        info!(context, "No selected audio track");
        return;
    };

    info!(
        context,
        codec = %quality.codec,
        lossless = quality.codec.is_lossless(),
        sample_rate = quality.sample_rate,
        tier = quality.tier().map(|tier| tier.as_str()),
        channels = quality.channels,
        bitrate_kbps = quality.bitrate.map(|bps| bps / 1000),
        bit_depth = quality.bit_depth,
        float_samples = quality.float_samples,
        container = quality.container.as_deref(),
        format_id = quality.format_id.as_deref(),
        "Audio quality"
    );

    if quality.below_cd_quality() {
        warn!(
            context,
            sample_rate = quality.sample_rate,
            "Sample rate below CD quality, output may be resampled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::engine::{GroupTrack, TrackType};

    fn flac_96_24() -> TrackFormat {
        TrackFormat {
            id: Some("1".to_string()),
            sample_mime_type: Some("audio/flac".to_string()),
            container_mime_type: Some("audio/mp4".to_string()),
            sample_rate: Some(96_000),
            channel_count: Some(2),
            bitrate: Some(4_608_000),
            pcm_encoding: Some(PcmEncoding::Pcm24),
        }
    }

    #[test]
    fn test_tiers() {
        assert_eq!(QualityTier::from_sample_rate(192_000), QualityTier::HiRes96);
        assert_eq!(QualityTier::from_sample_rate(96_000), QualityTier::HiRes96);
        assert_eq!(QualityTier::from_sample_rate(88_200), QualityTier::HiRes48);
        assert_eq!(QualityTier::from_sample_rate(48_000), QualityTier::HiRes48);
        assert_eq!(QualityTier::from_sample_rate(44_100), QualityTier::CdQuality);
        assert_eq!(QualityTier::from_sample_rate(22_050), QualityTier::Low);
        assert!(QualityTier::HiRes48.is_hi_res());
        assert!(!QualityTier::CdQuality.is_hi_res());
    }

    #[test]
    fn test_codec_from_mime() {
        assert_eq!(AudioCodec::from_mime(Some("audio/flac")), AudioCodec::Flac);
        assert_eq!(AudioCodec::from_mime(Some("AUDIO/MPEG")), AudioCodec::Mp3);
        assert_eq!(AudioCodec::from_mime(Some("audio/raw")), AudioCodec::Pcm);
        assert_eq!(
            AudioCodec::from_mime(Some("audio/eac3")),
            AudioCodec::Other("audio/eac3".to_string())
        );
        assert_eq!(AudioCodec::from_mime(None), AudioCodec::Unknown);
        assert!(AudioCodec::Alac.is_lossless());
        assert!(!AudioCodec::Aac.is_lossless());
    }

    #[test]
    fn test_quality_from_format() {
        let quality = AudioQuality::from_format(&flac_96_24());
        assert_eq!(quality.codec, AudioCodec::Flac);
        assert_eq!(quality.sample_rate, Some(96_000));
        assert_eq!(quality.bit_depth, Some(24));
        assert_eq!(quality.tier(), Some(QualityTier::HiRes96));
        assert!(!quality.below_cd_quality());

        let float = AudioQuality::from_format(&TrackFormat {
            pcm_encoding: Some(PcmEncoding::Float),
            sample_rate: Some(0),
            bitrate: Some(0),
            ..flac_96_24()
        });
        assert_eq!(float.bit_depth, Some(32));
        assert!(float.float_samples);
        assert_eq!(float.sample_rate, None);
        assert_eq!(float.bitrate, None);
        assert_eq!(float.tier(), None);
    }

    #[test]
    fn test_from_tracks_picks_selected_audio() {
        let groups = vec![
            TrackGroup {
                track_type: TrackType::Text,
                selected: true,
                tracks: vec![GroupTrack {
                    format: TrackFormat::default(),
                    selected: true,
                }],
            },
            TrackGroup {
                track_type: TrackType::Audio,
                selected: true,
                tracks: vec![
                    GroupTrack {
                        format: TrackFormat {
                            sample_rate: Some(44_100),
                            ..flac_96_24()
                        },
                        selected: false,
                    },
                    GroupTrack {
                        format: flac_96_24(),
                        selected: true,
                    },
                ],
            },
        ];

        let quality = AudioQuality::from_tracks(&groups).unwrap();
        assert_eq!(quality.sample_rate, Some(96_000));
        assert!(AudioQuality::from_tracks(&groups[..1]).is_none());
    }

    #[test]
    fn test_tracks_event() {
        let event = AudioQuality::from_format(&flac_96_24()).to_event();
        assert_eq!(
            event,
            ControlEvent::TracksChanged {
                sample_rate: Some(96_000),
                bit_depth: Some(24),
                channels: Some(2),
                codec: Some("FLAC".to_string()),
                tier: Some("hi_res_96".to_string()),
            }
        );
        assert_eq!(empty_tracks_event().name(), "tracks_changed");
    }

    #[test]
    fn test_low_rate_detection() {
        let quality = AudioQuality::from_format(&TrackFormat {
            sample_rate: Some(22_050),
            ..flac_96_24()
        });
        assert!(quality.below_cd_quality());
        log_audio_quality("test", Some(&quality));
        log_audio_quality("test", None);
    }
}
