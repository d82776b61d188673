//! Archival metadata document emitter.
//!
//! Serializes an enriched record into the national library `DigitalMediaId`
//! XML document and writes it next to the staged asset. The field table is
//! fixed by the delivery spec: most elements are deliberately emitted empty,
//! with the available metadata (names, credits, source title, and the raw
//! catalog documents as a debug payload) filled in.

mod xml;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::debug;

use crate::pipeline::records::StagedRecord;

use xml::XmlWriter;

/// Build the metadata document and write it as
/// `output_dir/{base_name}.xml`.
pub async fn write_metadata_document(staged: &StagedRecord) -> Result<()> {
    let target = staged
        .staging
        .output_dir
        .join(format!("{}.xml", staged.staging.base_name));
    debug!(
        track = %staged.record.track.document.name,
        target = %target.display(),
        "Writing metadata document"
    );

    let content = build_document(staged)?;
    fs::write(&target, content)
        .await
        .with_context(|| format!("Failed to write metadata document {:?}", target))?;
    Ok(())
}

/// Render the `DigitalMediaId` document for one record.
pub fn build_document(staged: &StagedRecord) -> Result<String> {
    let record = &staged.record;
    let year = record.year.to_string();

    let rightsholder = record
        .track
        .document
        .author
        .clone()
        .unwrap_or_else(|| record.uploader.profile.name.clone());

    let performers = record
        .artist
        .document
        .members
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    // The raw catalog documents ride along for the archive's debugging use.
    let other_documents = serde_json::to_string_pretty(&serde_json::json!({
        "year": record.year,
        "artist": record.artist.document,
        "track": record.track.document,
    }))
    .context("Failed to serialize raw document payload")?;

    let mut doc = XmlWriter::new();
    doc.open("DigitalMediaId");

    doc.leaf("SongTitle", &record.track.document.name);
    doc.leaf("Artist", &record.artist.document.name);
    doc.leaf("Rightsholder", &rightsholder);
    doc.leaf("Project", &format!("Bandwagon {}", year));
    doc.leaf("RevisionNumber", "R01");
    doc.leaf("MediaType", "DIS");
    doc.leaf("MasterType", "Amedia");
    doc.leaf("Date", &year);
    doc.leaf("GeneralNotes", "");

    doc.open("FileInfo");
    doc.empty_leaves(&[
        "SampleRate",
        "BitDepth",
        "MD5Checksum",
        "Length",
        "FileFormat",
        "Tracks",
        "ReferenceLevel",
        "LoudnessNormalizationLevel",
        "LoudnessRange",
        "TruePeak",
    ]);
    doc.close("FileInfo");

    doc.open("Credits");
    doc.leaf("Writers", "");
    doc.leaf("Performers", &performers);
    doc.empty_leaves(&[
        "Producers",
        "TrackingStudios",
        "TrackingEngineers",
        "MixingStudios",
        "MixingEngineers",
        "MasteringStudios",
        "MasteringEngineers",
        "CreditNotes",
    ]);
    doc.close("Credits");

    doc.open("Relations");
    doc.empty_leaves(&[
        "Album",
        "ArchiveTitleNumber",
        "ArchiveSegmentNumber",
        "ISRC",
    ]);
    doc.leaf("Source", &record.publication.title);
    doc.close("Relations");

    doc.open("ExternalDocuments");
    doc.leaf("CueSheet", "");
    doc.leaf("SessionInfo", "");
    doc.leaf("OtherDocuments", &other_documents);
    doc.close("ExternalDocuments");

    doc.open("Studio");
    doc.empty_leaves(&[
        "Studio",
        "DAWProgram",
        "HostComputer",
        "DAWSoftwareVersion",
        "SampleRate",
        "BitDepth",
        "SyncSource",
        "HostComputerOperatingSystem",
        "OriginalFormat",
        "ADConversion",
        "StorageMedia",
        "Monitoring",
        "Console",
        "ConsoleAutomation",
        "ConsoleAutomationBackupFormat",
        "MixBusSignalPath",
        "DAConversion",
        "Recorder",
        "StudioNotes",
    ]);
    doc.close("Studio");

    doc.open("ReproducerRecorder");
    doc.empty_leaves(&[
        "ReproducerRecorder",
        "Format",
        "Tracks",
        "TotalMachinesUsed",
        "TapeSpeed",
        "Tones",
        "SMPTERate",
        "SyncSource",
        "NoiseReductionUsed",
        "MediaManufacturer",
        "BitDepth",
        "SampleRate",
        "BitSplit",
        "ADConversion",
        "ReferenceLevel",
        "RRNotes",
    ]);
    doc.close("ReproducerRecorder");

    doc.open("Video");
    doc.empty_leaves(&[
        "EditingSoftware",
        "Version",
        "Format",
        "Resolution",
        "ColorSpace",
        "SamplingStructure",
        "GOPStructure",
        "FrameLayout",
        "ScreenFormat",
        "Bitrate",
        "FixedVaried",
        "HighestBitrate",
        "Fps",
        "TimecodeType",
        "Length",
        "BWColor",
    ]);
    doc.open("Audio");
    doc.empty_leaves(&["AudioFormat", "SampleRate", "BitDepth", "Bitrate", "Tracks"]);
    doc.close("Audio");
    doc.leaf("VideoNotes", "");
    doc.close("Video");

    doc.close("DigitalMediaId");
    Ok(doc.finish())
}
