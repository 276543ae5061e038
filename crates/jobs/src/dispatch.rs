//! Job dispatcher

use crate::{InputFile, JobError, JobRequest, Result, Transform};
use pdf_core::{mutate, transform, ImageInput, PdfDocument, Progress, SaveOptions};

/// Run a job to completion on the current thread
///
/// Reports `0` before anything else and `100` once the output is serialized.
/// Options and input counts are validated before any input is loaded. On
/// error nothing is returned but the error; the partially built document is
/// dropped.
///
/// # Arguments
/// * `request` - The job
/// * `progress` - Receives percentages and carries the cancellation flag
///
/// # Returns
/// One serialized document per output, in order
pub fn execute(request: &JobRequest, progress: &mut Progress) -> Result<Vec<Vec<u8>>> {
    log::info!(
        "job {} ({}) started with {} input(s)",
        request.id,
        request.kind,
        request.inputs.len()
    );
    progress.report(0)?;

    check_input_count(request)?;
    let job = Transform::parse(request.kind, &request.options)?;

    let mut output = run(&job, &request.inputs, progress)?;
    progress.report(95)?;

    let save = match job {
        Transform::Compress { .. } => SaveOptions::compact(),
        _ => SaveOptions::default(),
    };
    let bytes = output.to_bytes(save)?;
    drop(output);

    progress.finish()?;
    log::info!("job {} finished, {} bytes", request.id, bytes.len());
    Ok(vec![bytes])
}

fn check_input_count(request: &JobRequest) -> Result<()> {
    let count = request.inputs.len();
    if request.kind.accepts_many_inputs() {
        if count == 0 {
            return Err(JobError::validation(format!(
                "{} needs at least one input file",
                request.kind
            )));
        }
    } else if count != 1 {
        return Err(JobError::validation(format!(
            "{} needs exactly one input file, got {count}",
            request.kind
        )));
    }
    Ok(())
}

fn run(job: &Transform, inputs: &[InputFile], progress: &mut Progress) -> Result<PdfDocument> {
    let output = match job {
        Transform::Merge => {
            let documents = load_all(inputs, progress)?;
            transform::merge(&documents, progress)?
        }
        Transform::Split { pages } => {
            let source = load_single(inputs)?;
            let pages = pages
                .clone()
                .unwrap_or_else(|| (1..=source.page_count() as i64).collect());
            transform::extract_pages(&source, &pages, progress)?
        }
        Transform::DeletePages { pages_to_delete } => {
            let source = load_single(inputs)?;
            transform::delete_pages(&source, pages_to_delete, progress)?
        }
        Transform::ReorderPages { new_order } => {
            let source = load_single(inputs)?;
            transform::reorder_pages(&source, new_order, progress)?
        }
        Transform::AddBlankPages { insertions } => {
            let mut doc = load_single(inputs)?;
            mutate::add_blank_pages(&mut doc, insertions, progress)?;
            doc
        }
        Transform::Rotate { rotations } => {
            let mut doc = load_single(inputs)?;
            mutate::rotate(&mut doc, rotations, progress)?;
            doc
        }
        Transform::AddWatermark { text, opacity } => {
            let mut doc = load_single(inputs)?;
            mutate::add_watermark(&mut doc, text, *opacity, progress)?;
            doc
        }
        Transform::AddPageNumbers { position } => {
            let mut doc = load_single(inputs)?;
            mutate::add_page_numbers(&mut doc, *position, progress)?;
            doc
        }
        Transform::EditMetadata(update) => {
            let mut doc = load_single(inputs)?;
            mutate::edit_metadata(&mut doc, update, progress)?;
            doc
        }
        Transform::Flatten => {
            let mut doc = load_single(inputs)?;
            mutate::flatten(&mut doc, progress)?;
            doc
        }
        Transform::Compress { level } => {
            let doc = load_single(inputs)?;
            transform::compress(doc, *level, progress)?
        }
        Transform::ImageToPdf => {
            let images: Vec<ImageInput<'_>> = inputs
                .iter()
                .map(|file| ImageInput {
                    mime_type: &file.mime_type,
                    data: &file.data,
                })
                .collect();
            transform::images_to_pdf(&images, progress)?
        }
        Transform::TextToPdf => {
            let files: Vec<&[u8]> = inputs.iter().map(|file| file.data.as_slice()).collect();
            transform::texts_to_pdf(&files, progress)?
        }
    };
    Ok(output)
}

fn load_single(inputs: &[InputFile]) -> Result<PdfDocument> {
    match inputs {
        [file] => load(file),
        _ => Err(JobError::validation("Exactly one input file is required")),
    }
}

fn load_all(inputs: &[InputFile], progress: &mut Progress) -> Result<Vec<PdfDocument>> {
    let mut documents = Vec::with_capacity(inputs.len());
    for file in inputs {
        progress.check()?;
        documents.push(load(file)?);
    }
    Ok(documents)
}

fn load(file: &InputFile) -> Result<PdfDocument> {
    PdfDocument::from_bytes(&file.data).map_err(|err| {
        let mut err = JobError::from(err);
        if !file.name.is_empty() {
            err.message = format!("{}: {}", file.name, err.message);
        }
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, TransformKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn blank_pdf(pages: usize) -> Vec<u8> {
        let mut doc = PdfDocument::new();
        for _ in 0..pages {
            doc.add_page(595.0, 842.0).unwrap();
        }
        doc.to_bytes(SaveOptions::default()).unwrap()
    }

    fn pdf_input(pages: usize) -> InputFile {
        InputFile::new("in.pdf", "application/pdf", blank_pdf(pages))
    }

    #[test]
    fn test_input_count_checked_before_loading() {
        let request = JobRequest::new(
            "1",
            TransformKind::Rotate,
            vec![pdf_input(1), pdf_input(1)],
        );
        let err = execute(&request, &mut Progress::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "rotate needs exactly one input file, got 2");

        let request = JobRequest::new("2", TransformKind::Merge, vec![]);
        let err = execute(&request, &mut Progress::new()).unwrap_err();
        assert_eq!(err.message, "merge needs at least one input file");
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let request = JobRequest::new(
            "1",
            TransformKind::Flatten,
            vec![InputFile::new("broken.pdf", "application/pdf", b"nope".to_vec())],
        );
        let err = execute(&request, &mut Progress::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.message.starts_with("broken.pdf: Failed to load PDF"));
    }

    #[test]
    fn test_split_without_pages_keeps_everything() {
        let request = JobRequest::new("1", TransformKind::Split, vec![pdf_input(3)]);
        let output = execute(&request, &mut Progress::new()).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(PdfDocument::from_bytes(&output[0]).unwrap().page_count(), 3);
    }

    #[test]
    fn test_reports_start_and_finish() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: u8| seen.push(p);
            let mut progress = Progress::with_sink(&mut sink);
            let request = JobRequest::new("1", TransformKind::Rotate, vec![pdf_input(2)])
                .with_options(json!({ "rotations": { "1": 90 } }));
            execute(&request, &mut progress).unwrap();
        }
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.contains(&95));
    }
}
