use vsi_core::{
    AppViewModel, HistoryViewModel, JobStatus, Notification, NotificationKind, Phase, UploadJob,
};

const BAR_WIDTH: usize = 30;

pub fn progress_line(view: &AppViewModel) -> String {
    let filled = ((view.progress.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));

    let label = match view.phase {
        Phase::Idle => "Ready",
        Phase::Uploading if view.job_id.is_none() => "Uploading",
        Phase::Uploading if view.processing => "Processing",
        Phase::Uploading => "Waiting for server",
        Phase::Error => "Failed",
        Phase::Completed => "Completed",
    };

    let mut line = format!("[{bar}] {:>3.0}%  {label}", view.progress);
    if let Some(name) = &view.filename {
        line.push_str(&format!("  {name}"));
        if let Some(size) = view.file_size {
            line.push_str(&format!(" ({} bytes)", format_with_commas(size)));
        }
    }
    if let Some(job_id) = &view.job_id {
        line.push_str(&format!("  job {job_id}"));
    }
    line
}

pub fn notification_line(notification: &Notification) -> String {
    let tag = match notification.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Error => "error",
        NotificationKind::Info => "info",
    };
    format!("[{tag}] {}", notification.message)
}

/// One-shot status snapshot.
pub fn job_line(job: &UploadJob) -> String {
    let mut line = format!(
        "{}  {}  updated {}",
        job.job_id,
        job.status,
        job.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(name) = &job.filename {
        line.push_str(&format!("  {name}"));
    }
    if job.status == JobStatus::Failed {
        if let Some(message) = &job.error_message {
            line.push_str(&format!("  error: {message}"));
        }
    }
    line
}

pub fn history_table(view: &HistoryViewModel) -> String {
    let filter = view.filter.map_or("All", |status| status.as_str());
    let mut out = format!(
        "Upload history (filter: {filter}, page {}, {} per page)\n",
        view.page, view.limit
    );
    if let Some(error) = &view.error {
        out.push_str(&format!("[error] {error}\n"));
    }
    if view.jobs.is_empty() {
        out.push_str(if view.loading {
            "Loading...\n"
        } else {
            "No uploads found.\n"
        });
        return out;
    }

    let id_width = column_width("JOB ID", view.jobs.iter().map(|j| j.job_id.as_str().len()));
    let name_width = column_width(
        "FILE",
        view.jobs
            .iter()
            .map(|j| j.filename.as_deref().unwrap_or("-").len()),
    );
    out.push_str(&format!(
        "{:id_width$}  {:name_width$}  {:10}  {:19}  DETAIL\n",
        "JOB ID", "FILE", "STATUS", "CREATED"
    ));
    for job in &view.jobs {
        let detail = match (job.status, &job.error_message) {
            (JobStatus::Failed, Some(message)) => message.as_str(),
            _ => "",
        };
        let row = format!(
            "{:id_width$}  {:name_width$}  {:10}  {:19}  {detail}",
            job.job_id.as_str(),
            job.filename.as_deref().unwrap_or("-"),
            job.status.as_str(),
            job.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

fn column_width(header: &str, values: impl Iterator<Item = usize>) -> usize {
    values.fold(header.len(), usize::max)
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use vsi_core::JobId;

    fn job(id: &str, name: Option<&str>, status: JobStatus, hour: u32) -> UploadJob {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap();
        UploadJob {
            job_id: JobId::from(id),
            filename: name.map(str::to_string),
            status,
            created_at: at,
            updated_at: at,
            error_message: (status == JobStatus::Failed).then(|| "Corrupt archive".to_string()),
        }
    }

    #[test]
    fn progress_bar_reflects_phase_and_percent() {
        let view = AppViewModel {
            phase: Phase::Uploading,
            filename: Some("slide.zip".to_string()),
            file_size: Some(1_234_567),
            progress: 50.0,
            can_cancel: true,
            ..AppViewModel::default()
        };
        assert_eq!(
            progress_line(&view),
            format!(
                "[{}{}]  50%  Uploading  slide.zip (1,234,567 bytes)",
                "#".repeat(15),
                "-".repeat(15)
            )
        );

        let done = AppViewModel {
            phase: Phase::Completed,
            progress: 100.0,
            job_id: Some(JobId::from("job_42")),
            ..AppViewModel::default()
        };
        assert_eq!(
            progress_line(&done),
            format!("[{}] 100%  Completed  job job_42", "#".repeat(30))
        );
    }

    #[test]
    fn processing_is_labelled_separately_from_waiting() {
        let view = AppViewModel {
            phase: Phase::Uploading,
            job_id: Some(JobId::from("j")),
            progress: 97.0,
            processing: true,
            ..AppViewModel::default()
        };
        assert!(progress_line(&view).contains("Processing"));
        let waiting = AppViewModel {
            processing: false,
            ..view
        };
        assert!(progress_line(&waiting).contains("Waiting for server"));
    }

    #[test]
    fn notifications_are_tagged() {
        let line = notification_line(&Notification {
            kind: NotificationKind::Error,
            message: "Only ZIP files are allowed".to_string(),
        });
        assert_eq!(line, "[error] Only ZIP files are allowed");
    }

    #[test]
    fn history_table_lists_rows_with_failure_detail() {
        let view = HistoryViewModel {
            filter: None,
            page: 1,
            limit: 10,
            jobs: vec![
                job("job_2", Some("b.zip"), JobStatus::Failed, 9),
                job("job_1", None, JobStatus::Completed, 8),
            ],
            loading: false,
            error: None,
        };
        let table = history_table(&view);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Upload history (filter: All, page 1, 10 per page)");
        assert_eq!(
            lines[1],
            "JOB ID  FILE   STATUS      CREATED              DETAIL"
        );
        assert_eq!(
            lines[2],
            "job_2   b.zip  Failed      2024-05-01 09:00:00  Corrupt archive"
        );
        assert_eq!(lines[3], "job_1   -      Completed   2024-05-01 08:00:00");
    }

    #[test]
    fn empty_history_shows_load_error() {
        let view = HistoryViewModel {
            filter: Some(JobStatus::Processing),
            page: 2,
            limit: 5,
            jobs: Vec::new(),
            loading: false,
            error: Some(vsi_core::messages::HISTORY_LOAD_ERROR.to_string()),
        };
        let table = history_table(&view);
        assert!(table.starts_with("Upload history (filter: Processing, page 2, 5 per page)\n"));
        assert!(table.contains(&format!("[error] {}", vsi_core::messages::HISTORY_LOAD_ERROR)));
        assert!(table.ends_with("No uploads found.\n"));
    }

    #[test]
    fn job_line_includes_failure_message() {
        let line = job_line(&job("job_9", None, JobStatus::Failed, 10));
        assert_eq!(
            line,
            "job_9  Failed  updated 2024-05-01 10:00:00 UTC  error: Corrupt archive"
        );
    }
}
