//! Core types for the broadcast engine

use serde::{Deserialize, Serialize};

/// Maximum number of characters sent to the synthesis service in one request.
///
/// Longer narratives are truncated by the playback engine before the call.
pub const MAX_SYNTHESIS_TEXT_LEN: usize = 4000;

/// How a track's audio is obtained.
///
/// Resolved exactly once when the track is constructed, so the playback engine
/// never re-runs the URL/narrative fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioSource {
    /// A pre-resolved playable URL (podcast episode, pre-rendered narration)
    Direct {
        /// Full URL to the audio resource
        url: String,
    },

    /// Text that must be sent to the synthesis service before playback
    Synthesize {
        /// Narration text (narrative, summary, or title, in that priority)
        text: String,
    },
}

impl AudioSource {
    /// Returns the direct URL if one is available.
    pub fn url(&self) -> Option<&str> {
        match self {
            AudioSource::Direct { url } => Some(url),
            AudioSource::Synthesize { .. } => None,
        }
    }

    /// Returns `true` if playback requires a synthesis round-trip.
    pub fn needs_synthesis(&self) -> bool {
        matches!(self, AudioSource::Synthesize { .. })
    }
}

/// A playable unit of content
///
/// Constructed by the host application. Immutable from the engine's
/// perspective; the engine derives a resolved URL for the current playback
/// session without mutating the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier, unique within a session. Used for queue
    /// de-duplication and cache keying.
    pub id: String,

    /// Display title
    pub title: String,

    /// Provenance label (publisher name)
    pub source: String,

    /// Optional editorial category
    pub category: Option<String>,

    /// Resolved audio source
    pub audio: AudioSource,
}

impl Track {
    /// Build a track, resolving the audio source from the loosely-shaped
    /// fields the host supplies.
    ///
    /// Priority: a provided URL wins; otherwise the synthesis text is
    /// `narrative`, falling back to `summary`, falling back to the title.
    pub fn from_parts(
        id: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        audio_url: Option<String>,
        narrative: Option<String>,
        summary: Option<String>,
        category: Option<String>,
    ) -> Self {
        let title = title.into();
        let audio = match audio_url {
            Some(url) => AudioSource::Direct { url },
            None => AudioSource::Synthesize {
                text: narrative.or(summary).unwrap_or_else(|| title.clone()),
            },
        };

        Self {
            id: id.into(),
            title,
            source: source.into(),
            category,
            audio,
        }
    }
}

/// Content type carried on download and cache records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Narrated article
    Article,

    /// Podcast episode
    Podcast,

    /// Daily briefing
    Briefing,
}

impl ContentKind {
    /// Stable string form used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Podcast => "podcast",
            ContentKind::Briefing => "briefing",
        }
    }

    /// Parse the persisted string form. Unknown values map to `Article`.
    pub fn parse(value: &str) -> Self {
        match value {
            "podcast" => ContentKind::Podcast,
            "briefing" => ContentKind::Briefing,
            _ => ContentKind::Article,
        }
    }
}

/// Payload for the fire-and-forget history recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    /// Listening user
    pub user_id: String,

    /// Track that started playing
    pub track_id: String,

    /// Track title at play time
    pub title: String,

    /// Publisher label
    pub source: String,

    /// Editorial category, if any
    pub category: Option<String>,
}
