//! Style presets and the song classifier

use serde::{Deserialize, Serialize};

use super::Waveform;

/// Named choreography style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyleKind {
    /// Tight idol-group unison with a canon ripple
    #[default]
    SuperIdol,
    /// Loose street dance, no canon
    StreetVibe,
    /// Slow and flowing, with canon
    Ethereal,
}

impl StyleKind {
    /// Parameters of this style
    pub fn preset(self) -> StylePreset {
        match self {
            StyleKind::SuperIdol => StylePreset {
                speed: 1.1,
                tension: 1.5,
                canon: true,
                accent: Waveform::Sharp,
                flow: Waveform::Flow,
                impact: Some(Waveform::Strike),
            },
            StyleKind::StreetVibe => StylePreset {
                speed: 1.3,
                tension: 0.8,
                canon: false,
                accent: Waveform::Popping,
                flow: Waveform::Flow,
                impact: Some(Waveform::Strike),
            },
            StyleKind::Ethereal => StylePreset {
                speed: 0.8,
                tension: 1.2,
                canon: true,
                accent: Waveform::Flow,
                flow: Waveform::Flow,
                impact: None,
            },
        }
    }
}

/// Tempo, intensity and waveform selection of a style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    /// Multiplier on the beat rate
    pub speed: f32,
    /// Multiplier on accent limb amplitude
    pub tension: f32,
    /// Whether ranks are phase-delayed into a wave
    pub canon: bool,
    /// Drives elbows, torso roll, pelvis bounce and head snap
    pub accent: Waveform,
    /// Drives shoulders and spine lean
    pub flow: Waveform,
    /// Drives the head nod on hits; `None` keeps the head level
    #[serde(default)]
    pub impact: Option<Waveform>,
}

/// Style and opening formation chosen for a song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowPlan {
    /// Choreography style
    pub style: StyleKind,
    /// Name of the formation in the standard catalog
    pub formation: &'static str,
}

/// Pick a style from textual hints in a song reference
///
/// Case-insensitive substring rules, first match wins:
/// `bts`, `fast`, `pop` give SuperIdol in a V; `slow`, `ballad` give
/// Ethereal in a diamond; anything else is StreetVibe in a line.
pub fn classify_song(song: &str) -> ShowPlan {
    let song = song.to_lowercase();
    let has_any = |hints: &[&str]| hints.iter().any(|hint| song.contains(hint));

    if has_any(&["bts", "fast", "pop"]) {
        ShowPlan {
            style: StyleKind::SuperIdol,
            formation: "V_SHAPE",
        }
    } else if has_any(&["slow", "ballad"]) {
        ShowPlan {
            style: StyleKind::Ethereal,
            formation: "DIAMOND",
        }
    } else {
        ShowPlan {
            style: StyleKind::StreetVibe,
            formation: "CANON_LINE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::Formation;

    #[test]
    fn test_classify_song() {
        assert_eq!(classify_song("fast_track.mp3").style, StyleKind::SuperIdol);
        assert_eq!(classify_song("assets/BTS-Live.mp3").formation, "V_SHAPE");
        assert_eq!(classify_song("K-POP mix").style, StyleKind::SuperIdol);
        assert_eq!(classify_song("Slow Dance.ogg").style, StyleKind::Ethereal);
        assert_eq!(classify_song("midnight ballad").formation, "DIAMOND");
        assert_eq!(
            classify_song("assets/audio/song1.mp3"),
            ShowPlan {
                style: StyleKind::StreetVibe,
                formation: "CANON_LINE"
            }
        );
    }

    #[test]
    fn test_fast_hint_wins_over_slow() {
        assert_eq!(classify_song("slow-to-fast").style, StyleKind::SuperIdol);
    }

    #[test]
    fn test_plans_name_catalog_formations() {
        let catalog = Formation::standard_catalog();
        for song in ["pop", "ballad", "other"] {
            let plan = classify_song(song);
            assert!(catalog.iter().any(|f| f.name == plan.formation));
        }
    }

    #[test]
    fn test_presets() {
        let idol = StyleKind::SuperIdol.preset();
        assert_eq!((idol.speed, idol.tension, idol.canon), (1.1, 1.5, true));
        assert_eq!(idol.accent, Waveform::Sharp);

        let street = StyleKind::StreetVibe.preset();
        assert!(!street.canon);
        assert_eq!(street.accent, Waveform::Popping);
    }
}
