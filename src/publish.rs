use std::path::{Path, PathBuf};

use itertools::Itertools;
use miette::Diagnostic;
use tracing::{debug, info, warn};

use crate::{
    files, fs,
    integrations::{ApiRequestError, Release, ReleaseApi, ReleaseOptions},
    state::RunType,
};

/// Create a release, then attach every file matched by `patterns` to it.
///
/// A file that can't be opened or uploaded is skipped and reported in the returned summary.
/// Anything that goes wrong after the release exists, but isn't tied to one file, deletes the
/// release again so the pipeline can be re-run from scratch.
pub(crate) async fn publish<A: ReleaseApi>(
    api: RunType<&A>,
    options: &ReleaseOptions,
    patterns: &str,
) -> Result<UploadSummary, Error> {
    let (run_type, api) = api.take();
    let release = create_release(run_type.of(api), options).await?;
    match attach_files(run_type.of(api), &release, patterns).await {
        Ok(summary) => Ok(summary),
        Err(err) => Err(clean_up(run_type.of(api), &release, err).await),
    }
}

async fn create_release<A: ReleaseApi>(
    api: RunType<&A>,
    options: &ReleaseOptions,
) -> Result<Release, Error> {
    match api {
        RunType::DryRun(_) => {
            info!(
                "Would create release {tag} targeting {target} with title {title} and body:\n{body}",
                tag = options.tag_name,
                target = options.target_commit,
                title = options.title,
                body = options.body,
            );
            Ok(Release {
                id: 0,
                tag_name: options.tag_name.clone(),
                html_url: String::new(),
            })
        }
        RunType::Real(api) => {
            let release =
                api.create_release(options)
                    .await
                    .map_err(|source| Error::CreateRelease {
                        tag: options.tag_name.clone(),
                        source,
                    })?;
            info!("Release created: {id}", id = release.id);
            debug!("Release page is {url}", url = release.html_url);
            Ok(release)
        }
    }
}

async fn attach_files<A: ReleaseApi>(
    api: RunType<&A>,
    release: &Release,
    patterns: &str,
) -> Result<UploadSummary, Error> {
    let files = files::expand(patterns)?;
    let mut summary = UploadSummary::default();
    if files.is_empty() {
        info!("No files to upload");
        return Ok(summary);
    }
    info!(
        "Uploading files {}",
        files.iter().map(|file| file.display()).join(", ")
    );

    for path in files {
        match attach_file(api, release, &path).await {
            Ok(name) => summary.attached.push(name),
            Err(err) => {
                warn!("{err}");
                summary.failed.push((path, err));
            }
        }
    }
    Ok(summary)
}

async fn attach_file<A: ReleaseApi>(
    api: RunType<&A>,
    release: &Release,
    path: &Path,
) -> Result<String, UploadError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| UploadError::NoName(path.to_path_buf()))?;
    let file = fs::open(path).await?;

    match api {
        RunType::DryRun(_) => {
            info!(
                "Would attach {name} to release {tag}",
                tag = release.tag_name
            );
            Ok(name)
        }
        RunType::Real(api) => {
            info!("Attaching file {}", path.display());
            let attachment = api
                .create_attachment(release.id, file, &name)
                .await
                .map_err(|source| UploadError::Upload {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!("Attached {name}", name = attachment.name);
            debug!(
                "Attachment {id} is {size} bytes, download it from {url}",
                id = attachment.id,
                size = attachment.size,
                url = attachment.browser_download_url
            );
            Ok(attachment.name)
        }
    }
}

/// Delete `release` after `original` made it impossible to finish, returning the error to report.
async fn clean_up<A: ReleaseApi>(api: RunType<&A>, release: &Release, original: Error) -> Error {
    match api {
        RunType::DryRun(_) => {
            info!("Would delete release {tag}", tag = release.tag_name);
            original
        }
        RunType::Real(api) => match api.delete_release(release.id).await {
            Ok(()) => {
                warn!(
                    "Deleted release {id} so the pipeline can be re-run",
                    id = release.id
                );
                original
            }
            Err(source) => Error::CleanUp {
                release_id: release.id,
                source,
                original: vec![original],
            },
        },
    }
}

/// What happened to each file that was supposed to be attached.
#[derive(Debug, Default)]
pub(crate) struct UploadSummary {
    /// Names of the attachments that now exist on the release
    pub(crate) attached: Vec<String>,
    pub(crate) failed: Vec<(PathBuf, UploadError)>,
}

impl UploadSummary {
    /// Log the outcome for the whole run. Failures here never fail the run.
    pub(crate) fn report(&self) {
        if self.failed.is_empty() {
            if !self.attached.is_empty() {
                info!("Attached {} files", self.attached.len());
            }
            return;
        }
        warn!(
            "Attached {} of {} files, these could not be attached:",
            self.attached.len(),
            self.attached.len() + self.failed.len()
        );
        for (path, err) in &self.failed {
            warn!("\t{}: {err}", path.display());
        }
    }
}

/// A single file that could not be attached. The rest of the files are still attempted.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("No attachment name could be determined from path {0}")]
    NoName(PathBuf),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Open(#[from] fs::Error),
    #[error("Unable to upload file {path}: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: ApiRequestError,
    },
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Error creating release {tag}")]
    #[diagnostic(
        code(publish::create_release),
        help("Check that PLUGIN_TAG is set and that the repository exists.")
    )]
    CreateRelease {
        tag: String,
        #[source]
        #[diagnostic_source]
        source: ApiRequestError,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Files(#[from] files::Error),
    #[error("Unable to delete release {release_id} after a fatal error")]
    #[diagnostic(
        code(publish::clean_up),
        help("Delete the release by hand before re-running the pipeline.")
    )]
    CleanUp {
        release_id: i64,
        #[source]
        #[diagnostic_source]
        source: ApiRequestError,
        #[related]
        original: Vec<Error>,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_publish {
    use std::{
        cell::RefCell,
        fs::{create_dir_all, write},
        path::Path,
    };

    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use tokio::{fs::File, io::AsyncReadExt};

    use super::{Error, UploadError, publish};
    use crate::{
        integrations::{ApiRequestError, Attachment, Release, ReleaseApi, ReleaseOptions},
        state::RunType,
    };

    #[derive(Clone, Debug, Eq, PartialEq)]
    enum Call {
        CreateRelease(String),
        CreateAttachment {
            release_id: i64,
            name: String,
            contents: String,
        },
        DeleteRelease(i64),
    }

    /// Records every call instead of talking to a server.
    #[derive(Default)]
    struct FakeApi {
        calls: RefCell<Vec<Call>>,
        reject_release: bool,
        reject_attachment: Option<&'static str>,
        reject_delete: bool,
    }

    fn rejected(activity: &str) -> ApiRequestError {
        ApiRequestError::Status {
            host: "https://gitea.example.com".to_string(),
            activity: activity.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }
    }

    impl ReleaseApi for FakeApi {
        async fn create_release(
            &self,
            options: &ReleaseOptions,
        ) -> Result<Release, ApiRequestError> {
            self.calls
                .borrow_mut()
                .push(Call::CreateRelease(options.tag_name.clone()));
            if self.reject_release {
                return Err(rejected("creating a release"));
            }
            Ok(Release {
                id: 7,
                tag_name: options.tag_name.clone(),
                html_url: String::new(),
            })
        }

        async fn create_attachment(
            &self,
            release_id: i64,
            mut file: File,
            name: &str,
        ) -> Result<Attachment, ApiRequestError> {
            let mut contents = String::new();
            file.read_to_string(&mut contents).await.unwrap();
            self.calls.borrow_mut().push(Call::CreateAttachment {
                release_id,
                name: name.to_string(),
                contents,
            });
            if self.reject_attachment == Some(name) {
                return Err(rejected("attaching"));
            }
            Ok(Attachment {
                id: 1,
                name: name.to_string(),
                size: 0,
                browser_download_url: String::new(),
            })
        }

        async fn delete_release(&self, release_id: i64) -> Result<(), ApiRequestError> {
            self.calls
                .borrow_mut()
                .push(Call::DeleteRelease(release_id));
            if self.reject_delete {
                return Err(rejected("deleting a release"));
            }
            Ok(())
        }
    }

    fn options() -> ReleaseOptions {
        ReleaseOptions {
            tag_name: "v1.2.3".to_string(),
            target_commit: "abc123".to_string(),
            title: "Release 1.2.3".to_string(),
            body: "Notes".to_string(),
        }
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(path, relative).unwrap();
    }

    fn attachment(name: &str, contents: &str) -> Call {
        Call::CreateAttachment {
            release_id: 7,
            name: name.to_string(),
            contents: contents.to_string(),
        }
    }

    #[tokio::test]
    async fn attaches_every_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "dist/a.zip");
        touch(root, "dist/b.zip");
        touch(root, "out/report.txt");
        let patterns = format!(
            "{},{}",
            root.join("dist/*.zip").display(),
            root.join("out/report.txt").display()
        );
        let api = FakeApi::default();

        let summary = publish(RunType::Real(&api), &options(), &patterns)
            .await
            .unwrap();

        assert_eq!(summary.attached, vec!["a.zip", "b.zip", "report.txt"]);
        assert!(summary.failed.is_empty());
        assert_eq!(
            api.calls.into_inner(),
            vec![
                Call::CreateRelease("v1.2.3".to_string()),
                attachment("a.zip", "dist/a.zip"),
                attachment("b.zip", "dist/b.zip"),
                attachment("report.txt", "out/report.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn failed_upload_continues_with_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.zip");
        touch(root, "b.zip");
        let patterns = root.join("*.zip").display().to_string();
        let api = FakeApi {
            reject_attachment: Some("a.zip"),
            ..FakeApi::default()
        };

        let summary = publish(RunType::Real(&api), &options(), &patterns)
            .await
            .unwrap();

        assert_eq!(summary.attached, vec!["b.zip"]);
        assert_eq!(summary.failed.len(), 1);
        let (path, err) = &summary.failed[0];
        assert_eq!(path, &root.join("a.zip"));
        assert!(matches!(err, UploadError::Upload { .. }));
        assert!(
            !api.calls
                .borrow()
                .iter()
                .any(|call| matches!(call, Call::DeleteRelease(_)))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unopenable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // Matched by the glob, but opening it fails whoever runs the tests.
        std::os::unix::fs::symlink(root.join("missing"), root.join("a.zip")).unwrap();
        touch(root, "b.zip");
        let patterns = root.join("*.zip").display().to_string();
        let api = FakeApi::default();

        let summary = publish(RunType::Real(&api), &options(), &patterns)
            .await
            .unwrap();

        assert_eq!(summary.attached, vec!["b.zip"]);
        assert!(matches!(summary.failed[0].1, UploadError::Open(_)));
        assert_eq!(
            api.calls.into_inner(),
            vec![
                Call::CreateRelease("v1.2.3".to_string()),
                attachment("b.zip", "b.zip"),
            ]
        );
    }

    #[tokio::test]
    async fn release_failure_stops_everything() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.zip");
        let patterns = dir.path().join("*.zip").display().to_string();
        let api = FakeApi {
            reject_release: true,
            ..FakeApi::default()
        };

        let err = publish(RunType::Real(&api), &options(), &patterns)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CreateRelease { .. }));
        assert_eq!(
            api.calls.into_inner(),
            vec![Call::CreateRelease("v1.2.3".to_string())]
        );
    }

    #[tokio::test]
    async fn invalid_pattern_deletes_the_release() {
        let api = FakeApi::default();

        let err = publish(RunType::Real(&api), &options(), "dist/[.zip")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Files(_)));
        assert_eq!(
            api.calls.into_inner(),
            vec![
                Call::CreateRelease("v1.2.3".to_string()),
                Call::DeleteRelease(7),
            ]
        );
    }

    #[tokio::test]
    async fn failed_clean_up_reports_both_errors() {
        let api = FakeApi {
            reject_delete: true,
            ..FakeApi::default()
        };

        let err = publish(RunType::Real(&api), &options(), "dist/[.zip")
            .await
            .unwrap_err();

        match err {
            Error::CleanUp {
                release_id,
                original,
                ..
            } => {
                assert_eq!(release_id, 7);
                assert!(matches!(original.as_slice(), [Error::Files(_)]));
            }
            other => panic!("Expected a clean up error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dry_run_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.zip");
        let patterns = dir.path().join("*.zip").display().to_string();
        let api = FakeApi::default();

        let summary = publish(RunType::DryRun(&api), &options(), &patterns)
            .await
            .unwrap();

        assert_eq!(summary.attached, vec!["a.zip"]);
        assert!(api.calls.into_inner().is_empty());
    }

    #[tokio::test]
    async fn no_files_is_fine() {
        let api = FakeApi::default();

        let summary = publish(RunType::Real(&api), &options(), "")
            .await
            .unwrap();

        assert!(summary.attached.is_empty());
        assert_eq!(
            api.calls.into_inner(),
            vec![Call::CreateRelease("v1.2.3".to_string())]
        );
    }
}
