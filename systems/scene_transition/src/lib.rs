#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scene transition controller that fades the screen around a scene load.
//!
//! A transition fades a full-screen overlay from transparent to opaque, asks a
//! [`SceneLoader`] to load the requested scene, polls it once per update until
//! it reports readiness, then fades the overlay back out. Only one transition
//! runs at a time; requests made while one is in flight are dropped.

use std::{error::Error, fmt, time::Duration};

use tracing::{debug, info, warn};
use wings_runner_core::{fade_progress, Cue, SceneName};

/// Progress reported by a scene loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadProgress {
    /// The scene is still loading.
    Pending,
    /// The scene finished loading and may be activated.
    Ready,
}

/// Collaborator performing the actual scene load.
pub trait SceneLoader {
    /// Starts loading the named scene.
    fn begin_load(&mut self, scene: &SceneName) -> Result<(), SceneLoadError>;

    /// Reports the progress of the load started by [`SceneLoader::begin_load`].
    fn poll(&mut self) -> LoadProgress;
}

/// Errors reported by scene loaders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneLoadError {
    /// No scene with the requested name exists.
    UnknownScene {
        /// Name that failed to resolve.
        scene: SceneName,
    },
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownScene { scene } => write!(f, "unknown scene `{scene}`"),
        }
    }
}

impl Error for SceneLoadError {}

/// Coarse state of the transition, exposed for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// No transition in flight.
    Idle,
    /// Overlay fading to opaque.
    FadingOut,
    /// Waiting for the loader.
    Loading,
    /// Overlay fading back to transparent.
    FadingIn,
}

/// Configuration parameters required to construct the transition controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Time taken to fade the overlay to opaque.
    pub fade_out: Duration,
    /// Time taken to fade the overlay back to transparent.
    pub fade_in: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fade_out: Duration::from_millis(500),
            fade_in: Duration::from_millis(400),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum State {
    Idle,
    FadingOut { scene: SceneName, elapsed: Duration },
    Loading { scene: SceneName },
    FadingIn { elapsed: Duration },
}

/// Controller sequencing fade-out, load and fade-in.
#[derive(Debug)]
pub struct SceneTransition {
    config: Config,
    state: State,
    overlay_alpha: f32,
}

impl SceneTransition {
    /// Creates an idle controller with a transparent overlay.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: State::Idle,
            overlay_alpha: 0.0,
        }
    }

    /// Requests a faded load of the named scene.
    ///
    /// Returns `false` when the name is blank or a transition is already in
    /// flight; the request is dropped in both cases.
    pub fn load_scene_with_fade(&mut self, name: &str) -> bool {
        let Some(scene) = SceneName::new(name) else {
            debug!("ignoring scene request with an empty name");
            return false;
        };
        if self.is_loading() {
            debug!(%scene, "ignoring scene request while a transition is in flight");
            return false;
        }
        info!(%scene, "scene transition started");
        self.state = State::FadingOut {
            scene,
            elapsed: Duration::ZERO,
        };
        true
    }

    /// Reports whether a transition is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state != State::Idle
    }

    /// Coarse state of the transition.
    #[must_use]
    pub fn phase(&self) -> TransitionPhase {
        match self.state {
            State::Idle => TransitionPhase::Idle,
            State::FadingOut { .. } => TransitionPhase::FadingOut,
            State::Loading { .. } => TransitionPhase::Loading,
            State::FadingIn { .. } => TransitionPhase::FadingIn,
        }
    }

    /// Current alpha of the overlay.
    #[must_use]
    pub fn overlay_alpha(&self) -> f32 {
        self.overlay_alpha
    }

    /// Advances the transition by unscaled frame time.
    ///
    /// Returns the scene that finished loading during this update so the
    /// caller can activate it before the overlay fades back in.
    pub fn update(
        &mut self,
        real_dt: Duration,
        loader: &mut dyn SceneLoader,
        cues: &mut Vec<Cue>,
    ) -> Option<SceneName> {
        let mut activated = None;

        if let State::FadingOut { scene, elapsed } = &mut self.state {
            *elapsed = elapsed.saturating_add(real_dt);
            let progress = fade_progress(*elapsed, self.config.fade_out);
            let finished = progress >= 1.0;
            let scene = scene.clone();
            self.set_alpha(progress, cues);
            if finished {
                match loader.begin_load(&scene) {
                    Ok(()) => self.state = State::Loading { scene },
                    Err(error) => {
                        warn!(%error, "scene load failed; returning to the current scene");
                        self.state = State::FadingIn {
                            elapsed: Duration::ZERO,
                        };
                    }
                }
            }
            return activated;
        }

        if let State::Loading { scene } = &self.state {
            if loader.poll() == LoadProgress::Ready {
                info!(%scene, "scene loaded");
                activated = Some(scene.clone());
                self.state = State::FadingIn {
                    elapsed: Duration::ZERO,
                };
            }
            return activated;
        }

        if let State::FadingIn { elapsed } = &mut self.state {
            *elapsed = elapsed.saturating_add(real_dt);
            let progress = fade_progress(*elapsed, self.config.fade_in);
            self.set_alpha(1.0 - progress, cues);
            if progress >= 1.0 {
                debug!("scene transition finished");
                self.state = State::Idle;
            }
        }

        activated
    }

    fn set_alpha(&mut self, alpha: f32, cues: &mut Vec<Cue>) {
        self.overlay_alpha = alpha;
        cues.push(Cue::OverlayAlpha { alpha });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct InstantLoader {
        loads: Vec<SceneName>,
    }

    impl SceneLoader for InstantLoader {
        fn begin_load(&mut self, scene: &SceneName) -> Result<(), SceneLoadError> {
            self.loads.push(scene.clone());
            Ok(())
        }

        fn poll(&mut self) -> LoadProgress {
            LoadProgress::Ready
        }
    }

    #[test]
    fn blank_names_are_ignored() {
        let mut transition = SceneTransition::new(Config::default());
        assert!(!transition.load_scene_with_fade(""));
        assert!(!transition.load_scene_with_fade("  "));
        assert_eq!(transition.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn fade_out_is_linear() {
        let mut transition = SceneTransition::new(Config::default());
        let mut loader = InstantLoader::default();
        let mut cues = Vec::new();
        assert!(transition.load_scene_with_fade("Part2"));
        let _ = transition.update(Duration::from_millis(250), &mut loader, &mut cues);

        assert!((transition.overlay_alpha() - 0.5).abs() < 1e-5);
        assert_eq!(transition.phase(), TransitionPhase::FadingOut);
        assert!(loader.loads.is_empty());
    }

    #[test]
    fn failed_load_fades_back_in() {
        struct MissingLoader;
        impl SceneLoader for MissingLoader {
            fn begin_load(&mut self, scene: &SceneName) -> Result<(), SceneLoadError> {
                Err(SceneLoadError::UnknownScene {
                    scene: scene.clone(),
                })
            }

            fn poll(&mut self) -> LoadProgress {
                LoadProgress::Pending
            }
        }

        let mut transition = SceneTransition::new(Config::default());
        let mut cues = Vec::new();
        assert!(transition.load_scene_with_fade("Nowhere"));
        let _ = transition.update(Duration::from_secs(1), &mut MissingLoader, &mut cues);
        assert_eq!(transition.phase(), TransitionPhase::FadingIn);

        let activated = transition.update(Duration::from_secs(1), &mut MissingLoader, &mut cues);
        assert!(activated.is_none());
        assert_eq!(transition.phase(), TransitionPhase::Idle);
        assert_eq!(transition.overlay_alpha(), 0.0);
    }

    #[test]
    fn load_error_names_the_scene() {
        let error = SceneLoadError::UnknownScene {
            scene: SceneName::new("Part9").expect("valid scene"),
        };
        assert_eq!(error.to_string(), "unknown scene `Part9`");
    }
}
