// src/clipboard/system.rs
use super::backend::ClipboardBackend;
use super::types::{ClipboardError, ImageData, RawClipboardSnapshot, Representation};

use clipboard_rs::{Clipboard as _, ClipboardContext, ContentFormat};
use log::{debug, info};
use std::borrow::Cow;
use std::sync::mpsc;

enum Request {
    Snapshot(mpsc::Sender<Result<RawClipboardSnapshot, ClipboardError>>),
    Set(Representation, mpsc::Sender<Result<(), ClipboardError>>),
}

/// The OS clipboard.
///
/// Text and bitmaps go through arboard, the file-path list through
/// clipboard-rs. Both handles live on one dedicated thread for the lifetime of
/// this value: some platforms tie clipboard ownership to the handle that wrote
/// it, and neither handle has to cross threads that way.
pub struct SystemClipboard {
    requests: mpsc::Sender<Request>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let (requests, inbox) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("clipkeep-clipboard".to_string())
            .spawn(move || {
                let clipboard = match arboard::Clipboard::new() {
                    Ok(clipboard) => {
                        let _ = ready_tx.send(Ok(()));
                        clipboard
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(ClipboardError::from(e)));
                        return;
                    }
                };
                run_owner(clipboard, inbox);
            })
            .map_err(|e| {
                ClipboardError::ClipboardUnavailable(format!("Failed to spawn clipboard thread: {}", e))
            })?;

        ready_rx.recv().map_err(|_| owner_gone())??;
        info!("System clipboard opened");
        Ok(Self { requests })
    }

    fn call<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, ClipboardError>>) -> Request,
    ) -> Result<T, ClipboardError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests.send(build(reply_tx)).map_err(|_| owner_gone())?;
        reply_rx.recv().map_err(|_| owner_gone())?
    }
}

impl ClipboardBackend for SystemClipboard {
    fn snapshot(&mut self) -> Result<RawClipboardSnapshot, ClipboardError> {
        self.call(Request::Snapshot)
    }

    fn clear_and_set(&mut self, representation: Representation) -> Result<(), ClipboardError> {
        self.call(|reply| Request::Set(representation, reply))
    }
}

impl From<arboard::Error> for ClipboardError {
    fn from(err: arboard::Error) -> Self {
        match err {
            arboard::Error::ConversionFailure => ClipboardError::EncodingFailed(err.to_string()),
            other => ClipboardError::ClipboardUnavailable(other.to_string()),
        }
    }
}

fn owner_gone() -> ClipboardError {
    ClipboardError::ClipboardUnavailable("clipboard thread is not running".to_string())
}

// Exits once every SystemClipboard handle is dropped.
fn run_owner(mut clipboard: arboard::Clipboard, inbox: mpsc::Receiver<Request>) {
    let mut files: Option<ClipboardContext> = None;

    while let Ok(request) = inbox.recv() {
        match request {
            Request::Snapshot(reply) => {
                let _ = reply.send(read_snapshot(&mut clipboard, &mut files));
            }
            Request::Set(representation, reply) => {
                let _ = reply.send(write_representation(&mut clipboard, &mut files, representation));
            }
        }
    }

    debug!("Clipboard thread exiting");
}

// Reads in classification order and stops at the first usable representation,
// so an unchanged text clipboard never pays for a bitmap copy.
fn read_snapshot(
    clipboard: &mut arboard::Clipboard,
    files: &mut Option<ClipboardContext>,
) -> Result<RawClipboardSnapshot, ClipboardError> {
    match clipboard.get_text() {
        Ok(text) if !text.is_empty() => return Ok(Representation::Text(text).into()),
        Ok(_) | Err(arboard::Error::ContentNotAvailable) => {}
        Err(e) => return Err(e.into()),
    }

    match clipboard.get_image() {
        Ok(image) => {
            let image = ImageData::new(image.width, image.height, image.bytes.into_owned());
            return Ok(Representation::Bitmap(image).into());
        }
        Err(arboard::Error::ContentNotAvailable) => {}
        Err(e) => debug!("Bitmap representation unreadable: {}", e),
    }

    let ctx = match file_context(files) {
        Ok(ctx) => ctx,
        Err(e) => {
            debug!("File list unavailable: {}", e);
            return Ok(RawClipboardSnapshot::empty());
        }
    };

    if ctx.has(ContentFormat::Files) {
        match ctx.get_files() {
            Ok(paths) if !paths.is_empty() => return Ok(Representation::FileList(paths).into()),
            Ok(_) => {}
            Err(e) => debug!("File list unreadable: {}", e),
        }
    }

    Ok(RawClipboardSnapshot::empty())
}

fn write_representation(
    clipboard: &mut arboard::Clipboard,
    files: &mut Option<ClipboardContext>,
    representation: Representation,
) -> Result<(), ClipboardError> {
    clipboard.clear()?;

    match representation {
        Representation::Text(text) => clipboard.set_text(text)?,
        Representation::Bitmap(image) => {
            if !image.is_well_formed() {
                return Err(ClipboardError::EncodingFailed(format!(
                    "{}x{} bitmap with {} bytes",
                    image.width,
                    image.height,
                    image.bytes.len()
                )));
            }
            clipboard.set_image(arboard::ImageData {
                width: image.width,
                height: image.height,
                bytes: Cow::Owned(image.bytes),
            })?;
        }
        Representation::FileList(paths) => {
            let uris = paths.iter().map(|path| to_file_uri(path)).collect();
            file_context(files)?
                .set_files(uris)
                .map_err(|e| ClipboardError::ClipboardUnavailable(format!("Failed to set files: {}", e)))?;
        }
    }

    Ok(())
}

fn file_context(slot: &mut Option<ClipboardContext>) -> Result<&ClipboardContext, ClipboardError> {
    if slot.is_none() {
        let ctx = ClipboardContext::new().map_err(|e| {
            ClipboardError::ClipboardUnavailable(format!("Failed to open file clipboard: {}", e))
        })?;
        *slot = Some(ctx);
    }
    slot.as_ref()
        .ok_or_else(|| ClipboardError::ClipboardUnavailable("file clipboard not open".to_string()))
}

#[cfg(windows)]
fn to_file_uri(path: &str) -> String {
    path.to_string()
}

#[cfg(not(windows))]
fn to_file_uri(path: &str) -> String {
    if path.starts_with("file://") {
        return path.to_string();
    }
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("file://{}", encoded.join("/"))
}
