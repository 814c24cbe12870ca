//! Remote Fetcher - download a URL into the project.

use tracing::{info, instrument};

use crate::{
    application::{ports::Fetcher, services::Materializer},
    domain::{FetchSpec, StepOutcome, WriteMode},
    error::KilnResult,
};

/// Downloads a file and hands the body to the [`Materializer`].
///
/// No retries: a failed fetch fails the step and the run.
pub struct RemoteFetcher<'a> {
    fetcher: &'a dyn Fetcher,
    materializer: Materializer<'a>,
}

impl<'a> RemoteFetcher<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, materializer: Materializer<'a>) -> Self {
        Self {
            fetcher,
            materializer,
        }
    }

    #[instrument(skip_all, fields(url = %spec.url, path = %spec.path))]
    pub fn fetch_to(&self, spec: &FetchSpec) -> KilnResult<StepOutcome> {
        let body = self.fetcher.fetch(&spec.url)?;
        let bytes = body.len();

        self.materializer
            .write(&spec.path, &body, WriteMode::Overwrite)?;

        info!(url = %spec.url, bytes, "fetched");
        Ok(StepOutcome::Fetched { bytes })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use mockall::predicate::eq;

    use super::*;
    use crate::application::{
        ApplicationError,
        ports::MockFetcher,
        services::test_support::FakeFs,
    };
    use crate::domain::RelativePath;
    use crate::error::KilnError;

    fn spec() -> FetchSpec {
        FetchSpec::new(
            "https://example.com/.rubocop.yml",
            RelativePath::try_new(".rubocop.yml").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn body_is_written_with_overwrite() {
        let fs = FakeFs::default().with_file("/p/.rubocop.yml", "old");
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("https://example.com/.rubocop.yml"))
            .times(1)
            .returning(|_| Ok(b"AllCops:\n".to_vec()));

        let remote = RemoteFetcher::new(&fetcher, Materializer::new(&fs, Path::new("/p")));
        let outcome = remote.fetch_to(&spec()).unwrap();

        assert_eq!(outcome, StepOutcome::Fetched { bytes: 9 });
        assert_eq!(fs.read("/p/.rubocop.yml").as_deref(), Some("AllCops:\n"));
    }

    #[test]
    fn binary_body_is_not_decoded() {
        let body = vec![0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00, 0x01];
        let fs = FakeFs::default();
        let mut fetcher = MockFetcher::new();
        let served = body.clone();
        fetcher
            .expect_fetch()
            .returning(move |_| Ok(served.clone()));

        let remote = RemoteFetcher::new(&fetcher, Materializer::new(&fs, Path::new("/p")));
        let outcome = remote.fetch_to(&spec()).unwrap();

        assert_eq!(outcome, StepOutcome::Fetched { bytes: 8 });
        assert_eq!(fs.bytes("/p/.rubocop.yml"), Some(body));
    }

    #[test]
    fn network_error_writes_nothing() {
        let fs = FakeFs::default();
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|url| {
            Err(ApplicationError::Network {
                url: url.to_string(),
                status: Some(404),
                reason: "HTTP 404 Not Found".into(),
            }
            .into())
        });

        let remote = RemoteFetcher::new(&fetcher, Materializer::new(&fs, Path::new("/p")));
        let err = remote.fetch_to(&spec()).unwrap_err();

        assert!(matches!(
            err,
            KilnError::Application(ApplicationError::Network {
                status: Some(404),
                ..
            })
        ));
        assert!(fs.paths().is_empty());
    }
}
