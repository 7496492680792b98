use crate::model::{Track, TrackList};
use anyhow::{Context, Result};
use lofty::prelude::{Accessor, TaggedFileExt};
use lofty::probe::Probe;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

#[derive(Default)]
struct TrackMetadata {
    title: Option<String>,
    artist: Option<String>,
}

/// Walks `root` for audio files and builds the playlist: paths sorted,
/// indices assigned in order, tags read where available. Fails when nothing
/// playable is found.
pub fn scan(root: &Path) -> Result<TrackList> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_audio(path) {
            continue;
        }
        found.push(PathBuf::from(path));
    }

    found.sort();
    found.dedup();

    let tracks = found
        .iter()
        .enumerate()
        .map(|(index, path)| track_at(index, path))
        .collect();

    TrackList::new(tracks).with_context(|| format!("no audio files under {}", root.display()))
}

/// Stable identifier for a track, derived from its path the same way for
/// every scan.
pub fn track_id(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    digest
        .iter()
        .take(16)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn track_at(index: usize, path: &Path) -> Track {
    let metadata = metadata_for(path);
    let title = metadata
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .and_then(OsStr::to_str)
                .unwrap_or("unknown")
                .to_string()
        });
    let artist = metadata
        .artist
        .filter(|artist| !artist.trim().is_empty())
        .unwrap_or_else(|| String::from("Unknown Artist"));

    Track {
        id: track_id(path),
        index,
        title,
        artist,
        path: PathBuf::from(path),
    }
}

fn is_audio(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

fn metadata_for(path: &Path) -> TrackMetadata {
    let tagged = lofty_metadata(path);
    if tagged.title.is_some() || tagged.artist.is_some() {
        return tagged;
    }
    symphonia_metadata(path)
}

fn lofty_metadata(path: &Path) -> TrackMetadata {
    let Ok(tagged) = Probe::open(path).and_then(|probe| probe.read()) else {
        return TrackMetadata::default();
    };

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return TrackMetadata::default();
    };

    TrackMetadata {
        title: tag.title().map(|value| value.to_string()),
        artist: tag.artist().map(|value| value.to_string()),
    }
}

fn symphonia_metadata(path: &Path) -> TrackMetadata {
    let Ok(file) = File::open(path) else {
        return TrackMetadata::default();
    };
    let source = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(OsStr::to_str) {
        hint.with_extension(extension);
    }

    let Ok(mut probed) = get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) else {
        return TrackMetadata::default();
    };

    let metadata = probed.format.metadata();
    let Some(revision) = metadata.current() else {
        return TrackMetadata::default();
    };

    let tags = revision.tags();
    TrackMetadata {
        title: tag_value(tags, StandardTagKey::TrackTitle, &["title"]),
        artist: tag_value(
            tags,
            StandardTagKey::Artist,
            &["artist", "albumartist", "album_artist"],
        ),
    }
}

fn tag_value(
    tags: &[symphonia::core::meta::Tag],
    standard_key: StandardTagKey,
    fallback_keys: &[&str],
) -> Option<String> {
    let from_standard = tags
        .iter()
        .find(|tag| tag.std_key == Some(standard_key))
        .map(|tag| tag.value.to_string());

    let from_fallback = || {
        tags.iter()
            .find(|tag| {
                fallback_keys
                    .iter()
                    .any(|key| tag.key.eq_ignore_ascii_case(key))
            })
            .map(|tag| tag.value.to_string())
    };

    from_standard.or_else(from_fallback).and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
