use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::{
    db::Store,
    model::{ContactFilter, SortOrder, CSV_COLUMNS},
    repo, AppError, AppResult,
};

const PARTIAL_SUFFIX: &str = ".partial";

fn tmp_path(final_path: &Path) -> PathBuf {
    let mut s = OsString::from(final_path.as_os_str());
    s.push(PARTIAL_SUFFIX);
    PathBuf::from(s)
}

/// Write `header` and `rows` to `path` through a `.partial` sibling, renamed
/// into place once every row is flushed. Returns the number of data rows.
pub fn write_csv<I, R>(path: &Path, header: &[&str], rows: I) -> AppResult<usize>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let with_path = |err: AppError| err.with_context("path", path.display().to_string());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| with_path(err.into()))?;
    }

    let tmp = tmp_path(path);
    let written = (|| -> AppResult<usize> {
        let mut writer = Writer::from_path(&tmp)?;
        writer.write_record(header)?;
        let mut count = 0usize;
        for row in rows {
            writer.write_record(row)?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    })();

    match written {
        Ok(count) => {
            fs::rename(&tmp, path).map_err(|err| with_path(err.into()))?;
            Ok(count)
        }
        Err(err) => {
            let _ = fs::remove_file(&tmp);
            Err(with_path(err))
        }
    }
}

/// Dump every stored contact to `path`, ordered by last name, without ids.
pub async fn export_csv(store: &Store, path: &Path) -> AppResult<usize> {
    let contacts = repo::query(store, &ContactFilter::All, SortOrder::LastNameAsc).await?;
    write_csv(
        path,
        &CSV_COLUMNS,
        contacts.iter().map(|c| c.fields.as_csv_record()),
    )
}
