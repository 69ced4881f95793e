use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::error::{AtlasError, AtlasResult};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Scoped backup of the file being repaired. Every exit path restores the
/// original unless `commit` ran first.
struct BackupGuard {
    original: PathBuf,
    backup: PathBuf,
    committed: bool,
}

impl BackupGuard {
    fn create(path: &Path) -> AtlasResult<Self> {
        let backup = PathBuf::from(format!("{}.backup", path.display()));
        fs::copy(path, &backup)
            .with_context(|| format!("back up '{}' before repair", path.display()))?;
        Ok(Self {
            original: path.to_path_buf(),
            backup,
            committed: false,
        })
    }

    fn commit(mut self) {
        self.committed = true;
        let _ = fs::remove_file(&self.backup);
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::copy(&self.backup, &self.original);
            let _ = fs::remove_file(&self.backup);
        }
    }
}

/// Rewrites a PNG in place with every chunk checksum recomputed.
///
/// Recovers the one corruption class where chunk type and payload are intact
/// but the trailing CRC is wrong. The rebuilt bytes must decode before they
/// replace the original; truncated framing, a missing IEND or a post-rebuild
/// decode failure restores the backup and surfaces an error.
pub fn repair_png_checksums(path: &Path) -> AtlasResult<()> {
    let guard = BackupGuard::create(path)?;

    let data = fs::read(path).with_context(|| format!("read png '{}'", path.display()))?;
    let fixed = rebuild_with_checksums(&data)?;

    image::load_from_memory(&fixed).map_err(|err| {
        AtlasError::repair(format!(
            "'{}' still does not decode after checksum rewrite: {err}",
            path.display()
        ))
    })?;

    fs::write(path, &fixed)
        .with_context(|| format!("write repaired png '{}'", path.display()))?;
    guard.commit();

    tracing::info!(path = %path.display(), "repaired png chunk checksums");
    Ok(())
}

/// Copies the signature and every chunk verbatim, recomputing each trailing
/// CRC-32 over chunk type + payload, stopping after IEND.
fn rebuild_with_checksums(data: &[u8]) -> AtlasResult<Vec<u8>> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(AtlasError::repair("missing png signature"));
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&PNG_SIGNATURE);

    let mut pos = PNG_SIGNATURE.len();
    let mut saw_iend = false;
    while pos + 8 <= data.len() {
        let length = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            as usize;
        let chunk_end = pos + 8 + length + 4;
        if chunk_end > data.len() {
            return Err(AtlasError::repair("truncated png chunk"));
        }

        let chunk_type = &data[pos + 4..pos + 8];
        let payload = &data[pos + 8..pos + 8 + length];

        out.extend_from_slice(&data[pos..pos + 8]);
        out.extend_from_slice(payload);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(chunk_type);
        hasher.update(payload);
        out.extend_from_slice(&hasher.finalize().to_be_bytes());

        pos = chunk_end;
        if chunk_type == b"IEND" {
            saw_iend = true;
            break;
        }
    }

    if !saw_iend {
        return Err(AtlasError::repair("png ended before IEND chunk"));
    }
    Ok(out)
}
