//! The OCR engine collaborator: a trait seam for handlers plus the shipped
//! implementation that drives a long-lived engine process over stdio.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;
use std::{thread, time};

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::image::DecodedImage;

/// Failures internal to the engine collaborator. The gateway maps all of
/// them to a 500 without retrying.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine returned malformed output: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("engine process exited")]
    Exited,

    #[error("engine stdio unavailable")]
    Stdio,

    #[error("engine state poisoned by a previous failure")]
    Poisoned,

    #[error("image could not be encoded for the engine: {0}")]
    Encode(String),
}

/// The inference seam. One long-lived instance is shared by every handler;
/// implementations must be callable from any worker thread.
pub trait OcrEngine: Send + Sync {
    /// Run recognition on one decoded image, returning the engine's
    /// JSON-shaped result. Synchronous: callers dispatch to a blocking pool.
    fn recognize(&self, image: &DecodedImage) -> Result<Value, EngineError>;
}

#[derive(Serialize)]
struct EngineRequest<'a> {
    image_base64: &'a str,
}

struct EngineIo {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// An engine reached over a child process's stdin/stdout: one JSON request
/// line in, one JSON result line out.
///
/// The process is spawned once at startup and reused for every request. The
/// engine is not assumed safe for concurrent calls, so all inference is
/// serialized behind a single mutex.
pub struct StdioEngine {
    io: Mutex<EngineIo>,
}

impl StdioEngine {
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, EngineError> {
        info!("starting OCR engine process: {command}");
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take().ok_or(EngineError::Stdio)?;
        let stdout = child.stdout.take().map(BufReader::new).ok_or(EngineError::Stdio)?;

        // Give the child a moment to come up before the first request.
        thread::sleep(time::Duration::from_millis(200));

        info!("OCR engine process started (pid = {})", child.id());
        Ok(StdioEngine {
            io: Mutex::new(EngineIo {
                child,
                stdin,
                stdout,
            }),
        })
    }
}

impl OcrEngine for StdioEngine {
    fn recognize(&self, image: &DecodedImage) -> Result<Value, EngineError> {
        let png = image
            .to_png()
            .map_err(|e| EngineError::Encode(e.to_string()))?;
        let payload = general_purpose::STANDARD.encode(&png);
        let request = serde_json::to_string(&EngineRequest {
            image_base64: &payload,
        })?;

        // The single critical section around inference.
        let mut io = self.io.lock().map_err(|_| EngineError::Poisoned)?;

        writeln!(io.stdin, "{request}")?;
        io.stdin.flush()?;

        let mut line = String::new();
        let read = io.stdout.read_line(&mut line)?;
        if read == 0 {
            return Err(EngineError::Exited);
        }

        Ok(serde_json::from_str(line.trim())?)
    }
}

impl Drop for StdioEngine {
    fn drop(&mut self) {
        if let Ok(mut io) = self.io.lock() {
            let _ = io.child.kill();
            let _ = io.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::decode_image;
    use crate::image::tests::png_bytes;

    #[cfg(unix)]
    #[test]
    fn stdio_engine_round_trips_one_json_line_per_call() {
        // `cat` echoes each request line back, which is itself valid JSON.
        let engine = StdioEngine::spawn("cat", &[]).unwrap();
        let image = decode_image(&png_bytes(3, 2)).unwrap();

        let result = engine.recognize(&image).unwrap();
        let echoed = result["image_base64"].as_str().unwrap();
        let png = general_purpose::STANDARD.decode(echoed).unwrap();
        let round_tripped = decode_image(&png).unwrap();
        assert_eq!((round_tripped.width(), round_tripped.height()), (3, 2));

        // The channel stays usable for subsequent requests.
        let again = engine.recognize(&image).unwrap();
        assert!(again["image_base64"].is_string());
    }

    #[cfg(unix)]
    #[test]
    fn dead_engine_process_is_an_engine_error() {
        let engine = StdioEngine::spawn("true", &[]).unwrap();
        let image = decode_image(&png_bytes(2, 2)).unwrap();
        assert!(engine.recognize(&image).is_err());
    }

    #[test]
    fn missing_engine_binary_fails_to_spawn() {
        let err = StdioEngine::spawn("/nonexistent/ocr-engine-binary", &[]);
        assert!(matches!(err, Err(EngineError::Io(_))));
    }
}
