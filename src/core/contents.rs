use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

use super::card::CardId;
use super::map::MapData;
use super::table::TableData;

/// The closed set of card types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CardKind {
    #[default]
    Checkbox,
    Progression,
    Note,
    Image,
    Sound,
    Timer,
    Map,
    Table,
    Subpage,
    Link,
}

impl CardKind {
    pub const ALL: &'static [CardKind] = &[
        Self::Checkbox,
        Self::Progression,
        Self::Note,
        Self::Image,
        Self::Sound,
        Self::Timer,
        Self::Map,
        Self::Table,
        Self::Subpage,
        Self::Link,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkbox => "Checkbox",
            Self::Progression => "Progression",
            Self::Note => "Note",
            Self::Image => "Image",
            Self::Sound => "Sound",
            Self::Timer => "Timer",
            Self::Map => "Map",
            Self::Table => "Table",
            Self::Subpage => "Subpage",
            Self::Link => "Link",
        }
    }

    /// Images and notes never join stacks.
    pub fn allows_neighbors(&self) -> bool {
        !matches!(self, Self::Image | Self::Note)
    }

    /// Kinds that report their own complete / incomplete state.
    pub fn is_completable(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Progression)
    }

    /// Default size in grid cells.
    pub fn default_cells(&self) -> (f32, f32) {
        match self {
            Self::Note => (8.0, 2.0),
            Self::Image | Self::Map => (8.0, 8.0),
            Self::Table => (8.0, 3.0),
            _ => (8.0, 1.0),
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback stream owned by the audio collaborator.
///
/// The stream is shared with the audio callback thread; every mutation goes
/// through the surrounding mutex.
pub trait SoundStream: Send {
    /// Playback position in seconds.
    fn position(&self) -> f64;
    /// Stream length in seconds.
    fn length(&self) -> f64;
    fn set_paused(&mut self, paused: bool);
    fn seek(&mut self, seconds: f64);
}

pub type SharedStream = Arc<Mutex<dyn SoundStream>>;

/// An image or sound file reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceContents {
    pub path: String,
    /// Set when the resource failed to load; the path is kept.
    pub broken: bool,
}

#[derive(Clone, Default)]
pub struct SoundContents {
    pub resource: ResourceContents,
    pub playing: bool,
    pub stream: Option<SharedStream>,
}

impl fmt::Debug for SoundContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundContents")
            .field("resource", &self.resource)
            .field("playing", &self.playing)
            .field("stream", &self.stream.is_some())
            .finish()
    }
}

impl SoundContents {
    /// Run `f` on the stream while holding its lock.
    pub fn with_stream<R>(&self, f: impl FnOnce(&mut dyn SoundStream) -> R) -> Option<R> {
        let stream = self.stream.as_ref()?;
        match stream.lock() {
            Ok(mut guard) => Some(f(&mut *guard)),
            Err(e) => {
                log::error!("Sound stream lock poisoned for {}: {}", self.resource.path, e);
                None
            }
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.with_stream(|s| s.set_paused(!playing));
    }

    /// Seek relative to the current position, clamped to the stream.
    pub fn jump(&self, seconds: f64) {
        self.with_stream(|s| {
            let target = (s.position() + seconds).clamp(0.0, s.length().max(0.0));
            s.seek(target);
        });
    }

    /// Position over length, zero without a stream.
    pub fn progress(&self) -> f32 {
        self.with_stream(|s| {
            let length = s.length();
            if length > 0.0 {
                (s.position() / length).clamp(0.0, 1.0) as f32
            } else {
                0.0
            }
        })
        .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimerContents {
    pub name: String,
    pub minutes: u32,
    pub seconds: u32,
    /// Seconds run so far. Not persisted.
    pub elapsed: f64,
    pub running: bool,
}

impl TimerContents {
    pub fn total(&self) -> f64 {
        f64::from(self.minutes) * 60.0 + f64::from(self.seconds)
    }

    pub fn tick(&mut self, dt: f64) {
        if self.running {
            self.elapsed += dt;
        }
    }

    pub fn has_elapsed(&self) -> bool {
        self.running && self.total() > 0.0 && self.elapsed >= self.total()
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }
}

/// Where a link card points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Card(CardId),
    Url(String),
}

/// Kind-specific card state.
#[derive(Debug, Clone)]
pub enum Contents {
    Checkbox { checked: bool },
    Progression { current: i32, max: i32 },
    Note,
    Image(ResourceContents),
    Sound(SoundContents),
    Timer(TimerContents),
    Map(MapData),
    Table(TableData),
    /// Name of the board the subpage opens.
    Subpage { board: String },
    Link { target: Option<LinkTarget> },
}

impl Contents {
    pub fn default_for(kind: CardKind) -> Self {
        match kind {
            CardKind::Checkbox => Self::Checkbox { checked: false },
            CardKind::Progression => Self::Progression { current: 0, max: 10 },
            CardKind::Note => Self::Note,
            CardKind::Image => Self::Image(ResourceContents::default()),
            CardKind::Sound => Self::Sound(SoundContents::default()),
            CardKind::Timer => Self::Timer(TimerContents {
                name: "Timer".into(),
                minutes: 5,
                ..TimerContents::default()
            }),
            CardKind::Map => {
                let (w, h) = kind.default_cells();
                Self::Map(MapData::new(
                    (w * MAP_CELLS_PER_GRID) as usize,
                    (h * MAP_CELLS_PER_GRID) as usize,
                ))
            }
            CardKind::Table => Self::Table(TableData::default()),
            CardKind::Subpage => Self::Subpage {
                board: String::new(),
            },
            CardKind::Link => Self::Link { target: None },
        }
    }

    pub fn kind(&self) -> CardKind {
        match self {
            Self::Checkbox { .. } => CardKind::Checkbox,
            Self::Progression { .. } => CardKind::Progression,
            Self::Note => CardKind::Note,
            Self::Image(_) => CardKind::Image,
            Self::Sound(_) => CardKind::Sound,
            Self::Timer(_) => CardKind::Timer,
            Self::Map(_) => CardKind::Map,
            Self::Table(_) => CardKind::Table,
            Self::Subpage { .. } => CardKind::Subpage,
            Self::Link { .. } => CardKind::Link,
        }
    }

    pub fn resource(&self) -> Option<&ResourceContents> {
        match self {
            Self::Image(r) => Some(r),
            Self::Sound(s) => Some(&s.resource),
            _ => None,
        }
    }

    pub fn resource_mut(&mut self) -> Option<&mut ResourceContents> {
        match self {
            Self::Image(r) => Some(r),
            Self::Sound(s) => Some(&mut s.resource),
            _ => None,
        }
    }
}

/// Map cells are half a grid cell wide.
pub const MAP_CELLS_PER_GRID: f32 = 2.0;

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeStream {
        position: f64,
        paused: bool,
    }

    impl SoundStream for FakeStream {
        fn position(&self) -> f64 {
            self.position
        }
        fn length(&self) -> f64 {
            10.0
        }
        fn set_paused(&mut self, paused: bool) {
            self.paused = paused;
        }
        fn seek(&mut self, seconds: f64) {
            self.position = seconds;
        }
    }

    #[test]
    fn neighbor_rules() {
        assert!(!CardKind::Image.allows_neighbors());
        assert!(!CardKind::Note.allows_neighbors());
        assert!(CardKind::Timer.allows_neighbors());
        assert!(CardKind::Progression.is_completable());
        assert!(!CardKind::Table.is_completable());
    }

    #[test]
    fn default_contents_match_kind() {
        for kind in CardKind::ALL {
            assert_eq!(Contents::default_for(*kind).kind(), *kind);
        }
    }

    #[test]
    fn sound_controls_go_through_the_stream() {
        let stream = Arc::new(Mutex::new(FakeStream {
            position: 9.5,
            paused: true,
        }));
        let mut sound = SoundContents {
            stream: Some(stream.clone()),
            ..SoundContents::default()
        };
        sound.set_playing(true);
        assert!(!stream.lock().unwrap().paused);

        sound.jump(1.0);
        assert_eq!(stream.lock().unwrap().position, 10.0);
        assert_eq!(sound.progress(), 1.0);

        sound.jump(-20.0);
        assert_eq!(stream.lock().unwrap().position, 0.0);
    }

    #[test]
    fn timer_elapses_once_running() {
        let mut t = TimerContents {
            seconds: 2,
            ..TimerContents::default()
        };
        t.tick(5.0);
        assert!(!t.has_elapsed());
        t.running = true;
        t.tick(2.0);
        assert!(t.has_elapsed());
        t.reset();
        assert!(!t.has_elapsed());
    }
}
