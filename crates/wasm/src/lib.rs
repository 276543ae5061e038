//! WASM bindings for pdfworks
//!
//! This crate provides JavaScript-friendly API for:
//! - Running a job and streaming its progress to a callback
//! - Summarizing a PDF before choosing a transform
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { processJob, inspectPdf } from 'pdf-jobs-wasm';
//!
//! await init();
//!
//! const info = inspectPdf(pdfBytes);
//! console.log(`${info.pageCount} pages`);
//!
//! const message = processJob(
//!   {
//!     id: 'job-1',
//!     kind: 'delete-pages',
//!     inputs: [{ name: 'report.pdf', mimeType: 'application/pdf', data: pdfBytes }],
//!     options: { pagesToDelete: '2,4-6' },
//!   },
//!   (percent) => bar.value = percent,
//! );
//!
//! if (message.status === 'success') {
//!   download(message.data[0]);
//! }
//! ```

use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use pdf_core::{PdfDocument, Progress};
use pdf_jobs::{InputFile, JobMessage, JobRequest, TransformKind};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&CONSOLE_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Forwards `log` records to the browser console
struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Everything in a request except the input files
#[derive(Deserialize)]
struct RequestHeader {
    id: String,
    kind: TransformKind,
    #[serde(default)]
    options: serde_json::Value,
}

/// Run a job to completion
///
/// @param request - `{ id, kind, inputs: [{ name, mimeType, data: Uint8Array }], options }`
/// @param onProgress - Optional callback receiving percentages (0-100)
/// @returns `{ id, status: "success", data: Uint8Array[] }` or
///          `{ id, status: "error", error, kind }`
#[wasm_bindgen(js_name = processJob)]
pub fn process_job(request: JsValue, on_progress: Option<Function>) -> Result<JsValue, JsValue> {
    let request = read_request(&request)?;

    let mut sink = |percent: u8| {
        if let Some(callback) = &on_progress {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from(percent)) {
                log::warn!("progress callback failed: {err:?}");
            }
        }
    };
    let mut progress = Progress::with_sink(&mut sink);

    let message = match pdf_jobs::execute(&request, &mut progress) {
        Ok(data) => JobMessage::Success {
            id: request.id,
            data,
        },
        Err(err) => JobMessage::Error {
            id: request.id,
            error: err.message,
            kind: err.kind,
        },
    };
    message_to_js(&message)
}

/// Summarize page count, page sizes, rotation and metadata
///
/// @param data - PDF file bytes (Uint8Array)
/// @returns `{ pageCount, pages: [{ number, width, height, rotation }], title, ... }`
#[wasm_bindgen(js_name = inspectPdf)]
pub fn inspect_pdf(data: &[u8]) -> Result<JsValue, JsValue> {
    let doc = PdfDocument::from_bytes(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let info = doc.info().map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(serde_wasm_bindgen::to_value(&info)?)
}

fn read_request(request: &JsValue) -> Result<JobRequest, JsValue> {
    let header: RequestHeader = serde_wasm_bindgen::from_value(request.clone())?;

    let inputs_value = Reflect::get(request, &JsValue::from_str("inputs"))?;
    let mut inputs = Vec::new();
    if Array::is_array(&inputs_value) {
        for item in Array::from(&inputs_value).iter() {
            inputs.push(read_input(&item)?);
        }
    } else if !inputs_value.is_undefined() && !inputs_value.is_null() {
        return Err(JsValue::from_str("inputs must be an array"));
    }

    Ok(JobRequest::new(header.id, header.kind, inputs).with_options(header.options))
}

fn read_input(item: &JsValue) -> Result<InputFile, JsValue> {
    let name = Reflect::get(item, &JsValue::from_str("name"))?
        .as_string()
        .unwrap_or_default();
    let mime_type = Reflect::get(item, &JsValue::from_str("mimeType"))?
        .as_string()
        .unwrap_or_default();
    let data = Reflect::get(item, &JsValue::from_str("data"))?;
    if data.is_undefined() || data.is_null() {
        return Err(JsValue::from_str(&format!("input \"{name}\" has no data")));
    }
    let data = Uint8Array::new(&data).to_vec();
    Ok(InputFile::new(name, mime_type, data))
}

// Output buffers become Uint8Arrays rather than arrays of numbers
fn message_to_js(message: &JobMessage) -> Result<JsValue, JsValue> {
    match message {
        JobMessage::Success { id, data } => {
            let object = Object::new();
            Reflect::set(&object, &"id".into(), &JsValue::from_str(id))?;
            Reflect::set(&object, &"status".into(), &"success".into())?;
            let buffers: Array = data
                .iter()
                .map(|bytes| JsValue::from(Uint8Array::from(bytes.as_slice())))
                .collect();
            Reflect::set(&object, &"data".into(), &buffers)?;
            Ok(object.into())
        }
        other => Ok(serde_wasm_bindgen::to_value(other)?),
    }
}
