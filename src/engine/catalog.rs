//! Codec families and the encoder implementations known for each.
//!
//! Candidate lists are hand-curated and closed: software encoder first, then
//! vendor hardware variants. [`crate::engine::probe`] reorders them for display.

use std::fmt;

/// Video compression standard the user picks first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecFamily {
    H264,
    H265,
    Vp9,
    Av1,
}

impl CodecFamily {
    pub const ALL: [CodecFamily; 4] = [Self::H264, Self::H265, Self::Vp9, Self::Av1];

    /// Menu label
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::H264 => "H.264 / AVC",
            Self::H265 => "H.265 / HEVC",
            Self::Vp9 => "VP9",
            Self::Av1 => "AV1",
        }
    }

    /// Encoder candidates in catalog order
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::H264 => &["libx264", "h264_nvenc", "h264_qsv", "h264_amf"],
            Self::H265 => &["libx265", "hevc_nvenc", "hevc_qsv", "hevc_amf"],
            Self::Vp9 => &["libvpx-vp9", "vp9_qsv"],
            Self::Av1 => &["libaom-av1", "libsvtav1", "av1_nvenc", "av1_qsv", "av1_amf"],
        }
    }

    /// CRF-equivalent default for this family
    pub fn default_quality(&self) -> u8 {
        match self {
            Self::H264 => 23,
            Self::H265 => 28,
            Self::Vp9 => 31,
            Self::Av1 => 30,
        }
    }
}

impl fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

pub fn candidates_for(family: CodecFamily) -> &'static [&'static str] {
    family.candidates()
}

pub fn default_quality_for(family: CodecFamily) -> u8 {
    family.default_quality()
}
