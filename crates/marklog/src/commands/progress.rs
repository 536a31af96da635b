use marklog_session::ProgressLog;
use std::path::Path;

pub fn run(log: &Path) -> anyhow::Result<()> {
    let progress = ProgressLog::load(log)?;
    let done = progress.rows().iter().filter(|r| r.done).count();

    for row in progress.rows() {
        println!(
            "{} {} {}",
            if row.done { "[done]" } else { "[    ]" },
            row.case_id,
            row.session_folder,
        );
    }
    println!("{}/{} cases done", done, progress.rows().len());
    Ok(())
}
