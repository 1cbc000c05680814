//! Cutscene director port.

use crate::generation::Generation;

/// Request to play the transition cinematic for an age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutsceneCue {
    /// The age index the cutscene introduces.
    pub index: usize,
    /// Generation of the transition that issued the cue.
    pub generation: Generation,
}

/// External collaborator that plays transition cutscenes.
///
/// The transition has already been applied when the cue is delivered; the
/// director must not request it again.
pub trait CutsceneDirector: Send + Sync {
    /// Starts playback for `cue` without blocking the caller.
    fn play(&self, cue: CutsceneCue);
}
