//! Négociation de la qualité et du conteneur audio
//!
//! Pour chaque piste ou épisode, le service expose une liste de fichiers
//! distants (un par couple codec/débit). Ce module choisit celui à streamer :
//! d'abord la famille de codec (Vorbis, puis AAC, puis MP3), ensuite le palier
//! de qualité configuré, avec repli dégradé si le palier n'existe pas.

use crate::error::{Result, SpotifyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, warn};

/// Format d'un fichier distant (couple codec/débit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum AudioFormat {
    OGG_VORBIS_96,
    OGG_VORBIS_160,
    OGG_VORBIS_320,
    MP3_96,
    MP3_160,
    MP3_160_ENC,
    MP3_256,
    MP3_320,
    AAC_24,
    AAC_24_NORM,
    AAC_48,
    MP4_128,
    MP4_256,
    FLAC_FLAC,
    /// Format inconnu de cette version
    #[serde(other)]
    UNKNOWN,
}

impl AudioFormat {
    /// Famille de codec
    pub fn codec(&self) -> Codec {
        match self {
            AudioFormat::OGG_VORBIS_96 | AudioFormat::OGG_VORBIS_160 | AudioFormat::OGG_VORBIS_320 => {
                Codec::Vorbis
            }
            AudioFormat::MP3_96
            | AudioFormat::MP3_160
            | AudioFormat::MP3_160_ENC
            | AudioFormat::MP3_256
            | AudioFormat::MP3_320 => Codec::Mp3,
            AudioFormat::AAC_24 | AudioFormat::AAC_24_NORM | AudioFormat::AAC_48 => Codec::Aac,
            AudioFormat::MP4_128 | AudioFormat::MP4_256 | AudioFormat::FLAC_FLAC | AudioFormat::UNKNOWN => {
                Codec::Other
            }
        }
    }

    /// Palier de qualité, `None` pour les formats hors paliers
    pub fn quality(&self) -> Option<AudioQuality> {
        match self {
            AudioFormat::MP3_96 | AudioFormat::OGG_VORBIS_96 | AudioFormat::AAC_24_NORM => {
                Some(AudioQuality::Normal)
            }
            AudioFormat::MP3_160
            | AudioFormat::MP3_160_ENC
            | AudioFormat::OGG_VORBIS_160
            | AudioFormat::AAC_24 => Some(AudioQuality::High),
            AudioFormat::MP3_320
            | AudioFormat::MP3_256
            | AudioFormat::OGG_VORBIS_320
            | AudioFormat::AAC_48 => Some(AudioQuality::VeryHigh),
            _ => None,
        }
    }
}

/// Famille de codec d'un fichier distant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    Vorbis,
    Aac,
    Mp3,
    Other,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::Vorbis => "Vorbis",
            Codec::Aac => "AAC",
            Codec::Mp3 => "MP3",
            Codec::Other => "other",
        })
    }
}

/// Conteneur annoncé au framework de décodage pour choisir son démultiplexeur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    /// Vorbis dans Ogg
    OggVorbis,
    /// AAC dans un flux MPEG
    MpegAac,
    /// MP3 brut
    Mp3,
}

impl ContainerFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::OggVorbis => "audio/ogg",
            ContainerFormat::MpegAac => "audio/aac",
            ContainerFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl TryFrom<Codec> for ContainerFormat {
    type Error = SpotifyError;

    fn try_from(codec: Codec) -> Result<Self> {
        match codec {
            Codec::Vorbis => Ok(ContainerFormat::OggVorbis),
            Codec::Aac => Ok(ContainerFormat::MpegAac),
            Codec::Mp3 => Ok(ContainerFormat::Mp3),
            Codec::Other => Err(SpotifyError::UnsupportedFormat(codec.to_string())),
        }
    }
}

/// Palier de qualité demandé par la configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioQuality {
    /// ~96 kbps
    #[default]
    Normal,
    /// ~160 kbps
    High,
    /// ~320 kbps
    VeryHigh,
}

impl AudioQuality {
    /// Fichiers dont le format correspond exactement à ce palier
    pub fn matches<'a>(&self, files: &'a [RemoteFile]) -> Vec<&'a RemoteFile> {
        files
            .iter()
            .filter(|f| f.format.and_then(|fmt| fmt.quality()) == Some(*self))
            .collect()
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AudioQuality::Normal => "NORMAL",
            AudioQuality::High => "HIGH",
            AudioQuality::VeryHigh => "VERY_HIGH",
        })
    }
}

impl FromStr for AudioQuality {
    type Err = SpotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "normal" | "low" => Ok(AudioQuality::Normal),
            "high" => Ok(AudioQuality::High),
            "very_high" | "veryhigh" => Ok(AudioQuality::VeryHigh),
            other => Err(SpotifyError::Config(anyhow::anyhow!(
                "unknown audio quality '{}'",
                other
            ))),
        }
    }
}

/// Fichier audio distant d'une piste ou d'un épisode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Identifiant opaque (hexadécimal) du fichier
    pub file_id: String,
    /// Format, absent pour certains fichiers
    #[serde(default)]
    pub format: Option<AudioFormat>,
}

impl RemoteFile {
    pub fn new(file_id: impl Into<String>, format: AudioFormat) -> Self {
        Self {
            file_id: file_id.into(),
            format: Some(format),
        }
    }

    pub fn codec(&self) -> Option<Codec> {
        self.format.map(|f| f.codec())
    }
}

fn formats_to_string(files: &[RemoteFile]) -> String {
    let names: Vec<String> = files
        .iter()
        .map(|f| match f.format {
            Some(fmt) => format!("{:?}", fmt),
            None => "?".to_string(),
        })
        .collect();
    format!("[{}]", names.join(", "))
}

/// Stratégie de sélection d'un fichier parmi ceux disponibles
pub trait AudioQualityPicker: Send + Sync {
    fn get_file(&self, files: &[RemoteFile]) -> Option<RemoteFile>;
}

/// Sélection restreinte à une famille de codec, palier préféré d'abord
#[derive(Debug, Clone, Copy)]
pub struct CodecOnlyQuality {
    codec: Codec,
    preferred: AudioQuality,
}

impl CodecOnlyQuality {
    pub fn vorbis(preferred: AudioQuality) -> Self {
        Self {
            codec: Codec::Vorbis,
            preferred,
        }
    }

    pub fn aac(preferred: AudioQuality) -> Self {
        Self {
            codec: Codec::Aac,
            preferred,
        }
    }

    pub fn mp3(preferred: AudioQuality) -> Self {
        Self {
            codec: Codec::Mp3,
            preferred,
        }
    }

    fn find<'a>(&self, mut files: impl Iterator<Item = &'a RemoteFile>) -> Option<&'a RemoteFile> {
        files.find(|f| f.codec() == Some(self.codec))
    }
}

impl AudioQualityPicker for CodecOnlyQuality {
    fn get_file(&self, files: &[RemoteFile]) -> Option<RemoteFile> {
        let matches = self.preferred.matches(files);
        if let Some(file) = self.find(matches.into_iter()) {
            return Some(file.clone());
        }

        match self.find(files.iter()) {
            Some(file) => {
                warn!(
                    "Using {:?} because preferred {} {} couldn't be found",
                    file.format, self.codec, self.preferred
                );
                Some(file.clone())
            }
            None => {
                error!(
                    "Couldn't find any {} file, available: {}",
                    self.codec,
                    formats_to_string(files)
                );
                None
            }
        }
    }
}

/// Picker qui renvoie toujours un fichier déjà choisi
#[derive(Debug, Clone)]
pub struct FixedFile(pub RemoteFile);

impl AudioQualityPicker for FixedFile {
    fn get_file(&self, _files: &[RemoteFile]) -> Option<RemoteFile> {
        Some(self.0.clone())
    }
}

/// Choix au niveau piste : Vorbis si présent, sinon AAC, sinon MP3
pub fn pick(files: &[RemoteFile], preferred: AudioQuality) -> Option<RemoteFile> {
    let has = |codec: Codec| files.iter().any(|f| f.codec() == Some(codec));

    if has(Codec::Vorbis) {
        CodecOnlyQuality::vorbis(preferred).get_file(files)
    } else if has(Codec::Aac) {
        CodecOnlyQuality::aac(preferred).get_file(files)
    } else {
        CodecOnlyQuality::mp3(preferred).get_file(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, format: AudioFormat) -> RemoteFile {
        RemoteFile::new(id, format)
    }

    #[test]
    fn test_vorbis_wins_regardless_of_tier() {
        let files = vec![
            file("aac", AudioFormat::AAC_24),
            file("vorbis", AudioFormat::OGG_VORBIS_96),
        ];
        let chosen = pick(&files, AudioQuality::High).unwrap();
        assert_eq!(chosen.file_id, "vorbis");
    }

    #[test]
    fn test_preferred_tier_is_honoured_within_codec() {
        let files = vec![
            file("v96", AudioFormat::OGG_VORBIS_96),
            file("v160", AudioFormat::OGG_VORBIS_160),
            file("v320", AudioFormat::OGG_VORBIS_320),
        ];
        assert_eq!(pick(&files, AudioQuality::High).unwrap().file_id, "v160");
        assert_eq!(pick(&files, AudioQuality::VeryHigh).unwrap().file_id, "v320");
        assert_eq!(pick(&files, AudioQuality::Normal).unwrap().file_id, "v96");
    }

    #[test]
    fn test_aac_off_tier_when_no_vorbis() {
        let files = vec![
            file("mp3", AudioFormat::MP3_160),
            file("aac", AudioFormat::AAC_48),
        ];
        // AAC_48 est VERY_HIGH, le palier HIGH n'existe qu'en MP3
        assert_eq!(pick(&files, AudioQuality::High).unwrap().file_id, "aac");
    }

    #[test]
    fn test_mp3_fallback() {
        let files = vec![
            file("flac", AudioFormat::FLAC_FLAC),
            file("mp3", AudioFormat::MP3_320),
        ];
        assert_eq!(pick(&files, AudioQuality::Normal).unwrap().file_id, "mp3");
    }

    #[test]
    fn test_nothing_playable() {
        let files = vec![file("flac", AudioFormat::FLAC_FLAC)];
        assert!(pick(&files, AudioQuality::Normal).is_none());
        assert!(pick(&[], AudioQuality::Normal).is_none());
    }

    #[test]
    fn test_codec_only_ignores_other_codecs() {
        let files = vec![
            file("mp3", AudioFormat::MP3_96),
            RemoteFile {
                file_id: "nofmt".into(),
                format: None,
            },
        ];
        assert!(CodecOnlyQuality::aac(AudioQuality::Normal).get_file(&files).is_none());
        assert_eq!(
            CodecOnlyQuality::mp3(AudioQuality::VeryHigh)
                .get_file(&files)
                .unwrap()
                .file_id,
            "mp3"
        );
    }

    #[test]
    fn test_container_mapping() {
        assert_eq!(
            ContainerFormat::try_from(Codec::Vorbis).unwrap(),
            ContainerFormat::OggVorbis
        );
        assert_eq!(ContainerFormat::try_from(Codec::Aac).unwrap(), ContainerFormat::MpegAac);
        assert!(ContainerFormat::try_from(Codec::Other).is_err());
        assert_eq!(ContainerFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(ContainerFormat::MpegAac.mime_type(), "audio/aac");
    }

    #[test]
    fn test_quality_parsing() {
        assert_eq!("very_high".parse::<AudioQuality>().unwrap(), AudioQuality::VeryHigh);
        assert_eq!("HIGH".parse::<AudioQuality>().unwrap(), AudioQuality::High);
        assert_eq!("Very-High".parse::<AudioQuality>().unwrap(), AudioQuality::VeryHigh);
        assert!("ultra".parse::<AudioQuality>().is_err());
    }

    #[test]
    fn test_unknown_format_deserializes() {
        let f: RemoteFile =
            serde_json::from_str(r#"{"file_id":"ab","format":"OGG_OPUS_NEW"}"#).unwrap();
        assert_eq!(f.format, Some(AudioFormat::UNKNOWN));
        assert_eq!(f.codec(), Some(Codec::Other));
    }
}
