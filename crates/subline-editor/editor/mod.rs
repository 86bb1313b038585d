//! Editor session wiring the document to its views
//!
//! An [`Editor`] owns one [`Document`] plus the audio and video state that
//! commands read. The audio view follows the grid selection through a
//! subscription on the document channel; an attached spectrogram forgets its
//! columns when a new video is loaded and drops queued work when the audio
//! view moves.

use crate::commands::dialog::{DialogHost, DialogRequest, DialogResponse, NoDialogs};
use crate::config::Options;
use crate::core::{Document, DocumentEvent};
use crate::events::{Subscription, INTERNAL_PRIORITY};
use crate::views::{AudioState, SpectrogramView, VideoEvent, VideoState};
use core::cell::{Ref, RefCell, RefMut};
use futures::executor::block_on;
use std::rc::Rc;
use tracing::{debug, warn};

/// One open subtitle document and its views
pub struct Editor {
    /// The document being edited
    pub subs: Document,
    /// Video position and timecodes
    pub video: VideoState,
    /// Editor options
    pub options: Options,
    audio: Rc<RefCell<AudioState>>,
    spectrogram: Option<Rc<RefCell<SpectrogramView>>>,
    dialogs: Box<dyn DialogHost>,
    subscriptions: Vec<Subscription>,
}

impl core::fmt::Debug for Editor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Editor")
            .field("subs", &self.subs)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .field("spectrogram", &self.spectrogram.is_some())
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Create an editor with an empty document and no dialog host
    pub fn new(options: Options) -> Self {
        Self::with_video(options, VideoState::new())
    }

    /// Create an editor around a prepared video state
    pub fn with_video(options: Options, video: VideoState) -> Self {
        let subs = Document::with_config(options.undo_config());
        let audio = Rc::new(RefCell::new(AudioState::new()));

        let follower = Rc::clone(&audio);
        let follow = subs.events().subscribe_scoped(
            INTERNAL_PRIORITY,
            move |doc: &Document, event: &DocumentEvent| {
                let DocumentEvent::Selection(selection) = event else {
                    return;
                };
                match follower.try_borrow_mut() {
                    Ok(mut audio) => audio.follow_selection(&selection.indices, doc.lines()),
                    Err(_) => warn!("audio view busy; not following the selection"),
                }
            },
        );

        Self {
            subs,
            video,
            options,
            audio,
            spectrogram: None,
            dialogs: Box::new(NoDialogs),
            subscriptions: vec![follow],
        }
    }

    /// Replace the dialog host
    #[must_use]
    pub fn with_dialogs(mut self, host: impl DialogHost + 'static) -> Self {
        self.set_dialog_host(host);
        self
    }

    pub fn set_dialog_host(&mut self, host: impl DialogHost + 'static) {
        self.dialogs = Box::new(host);
    }

    /// Attach a spectrogram to the audio view and the video
    pub fn attach_spectrogram(&mut self, view: SpectrogramView) -> Rc<RefCell<SpectrogramView>> {
        let view = Rc::new(RefCell::new(view));

        let target = Rc::clone(&view);
        let on_view = self.audio.borrow().view_changed().subscribe_scoped(
            INTERNAL_PRIORITY,
            move |_: &AudioState, _: &()| {
                if let Ok(view) = target.try_borrow() {
                    view.on_view_changed();
                }
            },
        );
        let target = Rc::clone(&view);
        let on_video = self.video.changed().subscribe_scoped(
            INTERNAL_PRIORITY,
            move |_: &VideoState, event: &VideoEvent| {
                if *event == VideoEvent::Loaded {
                    if let Ok(view) = target.try_borrow() {
                        view.on_audio_loaded();
                    }
                }
            },
        );

        self.subscriptions.extend([on_view, on_video]);
        self.spectrogram = Some(Rc::clone(&view));
        view
    }

    pub fn spectrogram(&self) -> Option<&Rc<RefCell<SpectrogramView>>> {
        self.spectrogram.as_ref()
    }

    pub fn audio(&self) -> Ref<'_, AudioState> {
        self.audio.borrow()
    }

    pub fn audio_mut(&self) -> RefMut<'_, AudioState> {
        self.audio.borrow_mut()
    }

    /// Show a dialog and wait for the answer; `None` if it was cancelled
    pub fn ask(&self, request: DialogRequest) -> Option<DialogResponse> {
        let response = block_on(self.dialogs.open(request)).ok();
        if response.is_none() {
            debug!("dialog cancelled");
        }
        response
    }

    /// Deliver finished background work to the views
    ///
    /// Returns whether anything visible changed.
    pub fn pump(&mut self) -> bool {
        self.video.pump();
        match &self.spectrogram {
            Some(view) => match view.try_borrow_mut() {
                Ok(mut view) => {
                    view.pump();
                    view.take_repaint()
                }
                Err(_) => false,
            },
            None => false,
        }
    }
}
