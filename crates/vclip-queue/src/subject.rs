//! The closed set of named durable stream subjects (§4.B).

use std::fmt;

/// One work-class stream. Each subject is its own Redis Stream with its own
/// consumer group and its own dead-letter stream, so that e.g. purging
/// `SubtitleDetect` never touches `TranscodeJobs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    TranscodeJobs,
    SubtitleDetect,
    SubtitleTranscribe,
    SubtitleTranslate,
    ReelExport,
    GalleryJobs,
    WarmcacheJobs,
}

impl Subject {
    pub const ALL: [Subject; 7] = [
        Subject::TranscodeJobs,
        Subject::SubtitleDetect,
        Subject::SubtitleTranscribe,
        Subject::SubtitleTranslate,
        Subject::ReelExport,
        Subject::GalleryJobs,
        Subject::WarmcacheJobs,
    ];

    /// All three `subtitle.*` subjects, used by `clear_all` (§4.I) which
    /// purges them together while leaving transcode/warmcache untouched.
    pub const SUBTITLE: [Subject; 3] = [Subject::SubtitleDetect, Subject::SubtitleTranscribe, Subject::SubtitleTranslate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::TranscodeJobs => "transcode.jobs",
            Subject::SubtitleDetect => "subtitle.detect",
            Subject::SubtitleTranscribe => "subtitle.transcribe",
            Subject::SubtitleTranslate => "subtitle.translate",
            Subject::ReelExport => "reel.export",
            Subject::GalleryJobs => "gallery.jobs",
            Subject::WarmcacheJobs => "warmcache.jobs",
        }
    }

    /// Redis stream key for this subject.
    pub fn stream_key(&self) -> String {
        format!("vclip:stream:{}", self.as_str())
    }

    pub fn dlq_key(&self) -> String {
        format!("vclip:dlq:{}", self.as_str())
    }

    pub fn consumer_group(&self) -> String {
        format!("vclip:workers:{}", self.as_str())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtitle_group_excludes_other_subjects() {
        assert!(!Subject::SUBTITLE.contains(&Subject::TranscodeJobs));
        assert!(!Subject::SUBTITLE.contains(&Subject::WarmcacheJobs));
        assert_eq!(Subject::SUBTITLE.len(), 3);
    }
}
