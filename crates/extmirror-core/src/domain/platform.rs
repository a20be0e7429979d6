//! Target platform tags for platform-specific extension builds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Platform a version was built for.
///
/// Versions published without a platform tag are `Universal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TargetPlatform {
    #[default]
    Universal,
    Win32Ia32,
    Win32X64,
    Win32Arm64,
    LinuxX64,
    LinuxArm64,
    LinuxArmhf,
    AlpineX64,
    AlpineArm64,
    DarwinX64,
    DarwinArm64,
    Web,
}

impl TargetPlatform {
    /// Every known platform, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Universal,
        Self::Win32Ia32,
        Self::Win32X64,
        Self::Win32Arm64,
        Self::LinuxX64,
        Self::LinuxArm64,
        Self::LinuxArmhf,
        Self::AlpineX64,
        Self::AlpineArm64,
        Self::DarwinX64,
        Self::DarwinArm64,
        Self::Web,
    ];

    /// Wire representation (e.g. `"win32-x64"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Universal => "universal",
            Self::Win32Ia32 => "win32-ia32",
            Self::Win32X64 => "win32-x64",
            Self::Win32Arm64 => "win32-arm64",
            Self::LinuxX64 => "linux-x64",
            Self::LinuxArm64 => "linux-arm64",
            Self::LinuxArmhf => "linux-armhf",
            Self::AlpineX64 => "alpine-x64",
            Self::AlpineArm64 => "alpine-arm64",
            Self::DarwinX64 => "darwin-x64",
            Self::DarwinArm64 => "darwin-arm64",
            Self::Web => "web",
        }
    }

    /// Whether this is the platform-independent build.
    #[must_use]
    pub const fn is_universal(&self) -> bool {
        matches!(self, Self::Universal)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown platform tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target platform '{0}'")]
pub struct UnknownPlatform(pub String);

impl FromStr for TargetPlatform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::Universal);
        }
        Self::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

impl Serialize for TargetPlatform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TargetPlatform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // null and "" both mean "no platform tag"
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(Self::Universal),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
