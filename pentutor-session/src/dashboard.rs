/*
 * Copyright 2025 PenTutor Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Data behind the meetings and recordings pages.
//!
//! Fetching lives here, rendering does not: the UI asks for upcoming/past
//! splits, search results and join availability and draws whatever comes
//! back.

use chrono::{DateTime, Utc};
use log::{debug, info};
use pentutor_meeting_client::{ApiError, MeetingApiClient};
use pentutor_meeting_types::responses::{MeetingStatus, MeetingSummary, Recording};

/// Minutes before the scheduled start from which a meeting can be joined.
pub const JOIN_EARLY_MINUTES: i64 = 15;
/// Minutes after the scheduled start until which a meeting can be joined.
pub const JOIN_LATE_MINUTES: i64 = 30;

fn matches_query(title: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || title.to_lowercase().contains(&query.to_lowercase())
}

/// Meetings visible to the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct MeetingDirectory {
    meetings: Vec<MeetingSummary>,
}

impl MeetingDirectory {
    pub async fn fetch(client: &MeetingApiClient) -> Result<Self, ApiError> {
        let meetings = client.list_meetings().await?;
        info!("loaded {} meeting(s)", meetings.len());
        Ok(Self::from_meetings(meetings))
    }

    pub fn from_meetings(meetings: Vec<MeetingSummary>) -> Self {
        Self { meetings }
    }

    pub fn all(&self) -> &[MeetingSummary] {
        &self.meetings
    }

    /// Scheduled or in progress.
    pub fn upcoming(&self) -> Vec<&MeetingSummary> {
        self.meetings
            .iter()
            .filter(|m| matches!(m.status, MeetingStatus::Scheduled | MeetingStatus::Active))
            .collect()
    }

    pub fn past(&self) -> Vec<&MeetingSummary> {
        self.meetings
            .iter()
            .filter(|m| m.status == MeetingStatus::Ended)
            .collect()
    }

    /// Case-insensitive title match; a blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<&MeetingSummary> {
        self.meetings
            .iter()
            .filter(|m| matches_query(&m.title, query))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAvailability {
    Upcoming,
    Ready,
    Active,
    Ended,
}

/// Whether the join button is enabled for a meeting, and what it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinWindow {
    pub status: JoinAvailability,
    pub can_join: bool,
    /// Whole minutes until the scheduled start, negative once started.
    /// `None` for instant meetings.
    pub minutes_until: Option<i64>,
}

impl JoinWindow {
    pub fn evaluate(meeting: &MeetingSummary, now: DateTime<Utc>) -> Self {
        let scheduled = meeting
            .scheduled_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        let Some(start) = scheduled else {
            if let Some(raw) = &meeting.scheduled_time {
                debug!("meeting {}: unparseable start {raw}", meeting.meeting_id);
            }
            let active = meeting.status == MeetingStatus::Active;
            return Self {
                status: if active {
                    JoinAvailability::Active
                } else {
                    JoinAvailability::Ended
                },
                can_join: active,
                minutes_until: None,
            };
        };

        let minutes_until = (start - now).num_seconds().div_euclid(60);
        let (status, can_join) = if (-JOIN_LATE_MINUTES..=JOIN_EARLY_MINUTES).contains(&minutes_until)
        {
            if minutes_until <= 0 {
                (JoinAvailability::Active, true)
            } else {
                (JoinAvailability::Ready, true)
            }
        } else if minutes_until < -JOIN_LATE_MINUTES {
            (JoinAvailability::Ended, false)
        } else {
            (JoinAvailability::Upcoming, false)
        };

        Self {
            status,
            can_join,
            minutes_until: Some(minutes_until),
        }
    }

    /// Button caption.
    pub fn label(&self) -> String {
        match self.status {
            JoinAvailability::Ready => "Join Meeting".to_string(),
            JoinAvailability::Active => "Join Active Meeting".to_string(),
            JoinAvailability::Ended => "Meeting Ended".to_string(),
            JoinAvailability::Upcoming => match self.minutes_until {
                Some(minutes) if minutes >= 60 => {
                    format!("Starts in {}h {}m", minutes / 60, minutes % 60)
                }
                Some(minutes) => format!("Starts in {minutes}min"),
                None => "Not Available".to_string(),
            },
        }
    }
}

/// Past meeting recordings.
#[derive(Debug, Clone, Default)]
pub struct RecordingLibrary {
    recordings: Vec<Recording>,
}

impl RecordingLibrary {
    pub async fn fetch(client: &MeetingApiClient) -> Result<Self, ApiError> {
        let recordings = client.list_recordings().await?;
        info!("loaded {} recording(s)", recordings.len());
        Ok(Self::from_recordings(recordings))
    }

    pub fn from_recordings(recordings: Vec<Recording>) -> Self {
        Self { recordings }
    }

    pub fn all(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn search(&self, query: &str) -> Vec<&Recording> {
        self.recordings
            .iter()
            .filter(|r| matches_query(&r.meeting_title, query))
            .collect()
    }

    /// Suggested file name when saving a recording.
    pub fn download_file_name(recording: &Recording) -> String {
        format!("{}-recording.mp4", recording.meeting_title)
    }

    /// Fetch the raw recording bytes.
    pub async fn download(
        client: &MeetingApiClient,
        recording: &Recording,
    ) -> Result<(String, Vec<u8>), ApiError> {
        let bytes = client.download_recording(&recording.meeting_id).await?;
        info!(
            "downloaded recording of {} ({} bytes)",
            recording.meeting_id,
            bytes.len()
        );
        Ok((Self::download_file_name(recording), bytes))
    }
}
