//! [`TagReader`] backed by lofty.
//!
//! Supports MP3, FLAC, OGG, M4A, WAV and everything else lofty probes.
//! Synchronized lyrics are only read from the ID3v2 tag of MPEG files.

use lofty::config::ParseOptions;
use lofty::error::{ErrorKind, LoftyError};
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::id3::v2::{Frame, SynchronizedTextFrame, TimestampFormat};
use lofty::mpeg::MpegFile;
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use super::{
    AudioProperties, EmbeddedPicture, RawTags, SyncedLyrics, TagReadError, TagReader,
    TimestampUnit,
};

impl From<LoftyError> for TagReadError {
    fn from(err: LoftyError) -> Self {
        match err.kind() {
            ErrorKind::UnknownFormat => Self::UnsupportedFormat(err.to_string()),
            ErrorKind::Io(_) => Self::Io(err.to_string()),
            _ => Self::CorruptFile(err.to_string()),
        }
    }
}

/// Tag reader using lofty's format probing.
#[derive(Clone, Copy)]
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<RawTags, TagReadError> {
        // Probe::open only ever opens the file for reading
        let tagged_file = Probe::open(path)?
            .options(self.parse_options)
            .guess_file_type()?
            .read()?;

        let properties = tagged_file.properties();
        let mut raw = RawTags {
            properties: AudioProperties {
                duration: properties.duration(),
                sample_rate: properties.sample_rate(),
                bitrate: properties.audio_bitrate(),
                channels: properties.channels(),
            },
            ..Default::default()
        };

        // Prefer the format's primary tag, fall back to the first available
        match tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        {
            Some(tag) => fill_from_tag(&mut raw, tag),
            None => debug!(path = %path.display(), "File has no tags"),
        }

        Ok(raw)
    }

    fn read_synced_lyrics(&self, path: &Path) -> Result<Vec<SyncedLyrics>, TagReadError> {
        let file_type = Probe::open(path)?.guess_file_type()?.file_type();
        if file_type != Some(FileType::Mpeg) {
            return Ok(Vec::new());
        }

        let mut file = File::open(path)?;
        let mpeg = MpegFile::read_from(&mut file, ParseOptions::new().read_properties(false))?;
        let Some(id3v2) = mpeg.id3v2() else {
            return Ok(Vec::new());
        };

        let mut frames = Vec::new();
        for frame in id3v2 {
            if frame.id().as_str() != "SYLT" {
                continue;
            }
            let Frame::Binary(binary) = frame else {
                continue;
            };
            let sylt = SynchronizedTextFrame::parse(&binary.data, frame.flags())?;
            let unit = if sylt.timestamp_format == TimestampFormat::MS {
                TimestampUnit::Milliseconds
            } else {
                TimestampUnit::MpegFrames
            };
            frames.push(SyncedLyrics {
                unit,
                lines: sylt.content,
            });
        }

        Ok(frames)
    }
}

fn fill_from_tag(raw: &mut RawTags, tag: &Tag) {
    let text = |key: ItemKey| tag.get_string(&key).map(str::to_string);

    raw.title = tag.title().map(|s| s.into_owned());
    raw.artist = tag.artist().map(|s| s.into_owned());
    raw.performers = tag
        .get_strings(&ItemKey::TrackArtist)
        .map(str::to_string)
        .collect();
    raw.album = tag.album().map(|s| s.into_owned());
    raw.album_artist = text(ItemKey::AlbumArtist);
    raw.year = tag.year();
    raw.track = tag.track();
    raw.track_total = tag.track_total();
    raw.disc = tag.disk();
    raw.disc_total = tag.disk_total();
    raw.genres = tag
        .get_strings(&ItemKey::Genre)
        .map(str::to_string)
        .collect();
    raw.composer = text(ItemKey::Composer);
    raw.grouping = text(ItemKey::ContentGroup);
    raw.copyright = text(ItemKey::CopyrightMessage);
    raw.comment = tag.comment().map(|s| s.into_owned());
    raw.conductor = text(ItemKey::Conductor);
    raw.bpm = text(ItemKey::IntegerBpm)
        .or_else(|| text(ItemKey::Bpm))
        .and_then(|s| parse_bpm(&s));
    raw.musicbrainz_track_id =
        text(ItemKey::MusicBrainzTrackId).or_else(|| text(ItemKey::MusicBrainzRecordingId));
    raw.musicbrainz_release_id = text(ItemKey::MusicBrainzReleaseId);
    raw.lyrics = text(ItemKey::Lyrics);

    let pictures = tag.pictures();
    raw.picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
        .map(|picture| EmbeddedPicture {
            data: picture.data().to_vec(),
            mime_type: mime_type_str(picture.mime_type()).to_string(),
        });
}

fn mime_type_str(mime: Option<&MimeType>) -> &'static str {
    match mime {
        Some(MimeType::Png) => "image/png",
        Some(MimeType::Gif) => "image/gif",
        Some(MimeType::Bmp) => "image/bmp",
        Some(MimeType::Tiff) => "image/tiff",
        _ => "image/jpeg",
    }
}

/// BPM tags are sometimes written as decimals ("120.00").
fn parse_bpm(value: &str) -> Option<u32> {
    let value = value.trim();
    value
        .parse::<u32>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f.round() as u32))
}
