use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Outcome, Summary, ARCHIVE_EXTENSION};

/// An entry of an archive, with the path it declares relative to the extraction root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub path: PathBuf,
    pub is_directory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    Extract,
    Skip,
}

/// Told about every member an [`ArchiveReader`] walks over.
pub trait MemberVisitor {
    /// Whether `member` should be written. An error stops the walk.
    fn decide(&mut self, member: &ArchiveMember) -> Result<MemberAction>;

    /// `member` is on disk.
    fn extracted(&mut self, member: &ArchiveMember);
}

/// Reads archives member by member.
pub trait ArchiveReader {
    /// Asks `visitor` about every member of `archive` in stored order and writes the members it
    /// answers [`MemberAction::Extract`] for below `destination`.
    fn extract_members(
        &self,
        archive: &Path,
        destination: &Path,
        visitor: &mut dyn MemberVisitor,
    ) -> Result<()>;
}

impl<R: ArchiveReader + ?Sized> ArchiveReader for &R {
    fn extract_members(
        &self,
        archive: &Path,
        destination: &Path,
        visitor: &mut dyn MemberVisitor,
    ) -> Result<()> {
        (**self).extract_members(archive, destination, visitor)
    }
}

/// [`ArchiveReader`] for RAR archives, backed by the bundled unrar library.
#[derive(Debug, Default, Clone, Copy)]
pub struct RarReader;

impl ArchiveReader for RarReader {
    fn extract_members(
        &self,
        archive: &Path,
        destination: &Path,
        visitor: &mut dyn MemberVisitor,
    ) -> Result<()> {
        let to_error = |e| unrar_error(archive, e);

        let mut open = unrar::Archive::new(archive)
            .open_for_processing()
            .map_err(to_error)?;

        while let Some(header) = open.read_header().map_err(to_error)? {
            let entry = header.entry();
            let member = ArchiveMember {
                path: entry.filename.clone(),
                is_directory: entry.is_directory(),
            };

            open = match visitor.decide(&member)? {
                MemberAction::Extract => {
                    let next = header.extract_with_base(destination).map_err(to_error)?;
                    visitor.extracted(&member);
                    next
                }
                MemberAction::Skip => header.skip().map_err(to_error)?,
            };
        }
        Ok(())
    }
}

fn unrar_error(archive: &Path, error: impl std::fmt::Display) -> Error {
    Error::Archive(format!("{}: {error}", archive.display()))
}

pub struct ArchiveExtractor<R = RarReader> {
    reader: R,
}

impl<R: ArchiveReader> ArchiveExtractor<R> {
    pub fn new(reader: R) -> Self {
        ArchiveExtractor { reader }
    }

    /// Extracts every member of every archive in `directory` that is not on disk yet. Members are
    /// tallied one by one, an archive that cannot be read counts as one failure.
    pub fn run(&self, directory: &Path) -> Summary {
        let mut summary = Summary::default();

        let archives = match archives_in(directory) {
            Ok(archives) => archives,
            Err(error) => {
                summary.record(&directory.display().to_string(), Err(error));
                return summary;
            }
        };

        for archive in archives {
            let result = self.extract(&archive, directory, &mut summary);
            if let Err(error) = result {
                summary.record(&archive.display().to_string(), Err(error));
            }
        }
        summary
    }

    fn extract(&self, archive: &Path, directory: &Path, summary: &mut Summary) -> Result<()> {
        let mut tally = MemberTally { archive, directory, summary };
        self.reader.extract_members(archive, directory, &mut tally)
    }
}

/// Per-member dedupe against the extraction directory, counting members once they are written.
struct MemberTally<'a> {
    archive: &'a Path,
    directory: &'a Path,
    summary: &'a mut Summary,
}

impl MemberVisitor for MemberTally<'_> {
    fn decide(&mut self, member: &ArchiveMember) -> Result<MemberAction> {
        if member.is_directory {
            return Ok(MemberAction::Skip);
        }
        check_member_path(self.archive, &member.path)?;

        let name = member.path.display().to_string();
        if self.directory.join(&member.path).is_file() {
            info!(file = %name, "[Extract] {name} already extracted, skipping.");
            self.summary.record(&name, Ok(Outcome::Skipped));
            Ok(MemberAction::Skip)
        } else {
            info!(file = %name, "[Extract] Extracting {name}.");
            Ok(MemberAction::Extract)
        }
    }

    fn extracted(&mut self, member: &ArchiveMember) {
        self.summary.record(&member.path.display().to_string(), Ok(Outcome::Completed));
    }
}

/// Archives directly inside `directory`, sorted by name.
pub fn archives_in(directory: &Path) -> Result<Vec<PathBuf>> {
    files_with_extension(directory, ARCHIVE_EXTENSION)
}

pub(crate) fn files_with_extension(directory: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory).map_err(|e| Error::filesystem(directory, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::filesystem(directory, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn check_member_path(archive: &Path, member: &Path) -> Result<()> {
    let escapes = member
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));

    if escapes {
        return Err(Error::Archive(format!(
            "{archive}: member {member} points outside the extraction directory",
            archive = archive.display(),
            member = member.display()
        )));
    }
    Ok(())
}
