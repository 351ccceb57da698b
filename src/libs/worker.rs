use crate::libs::job::JobDescriptor;
use crate::libs::plan::WorkUnit;
use crate::libs::provider::SequenceProvider;
use crate::libs::scorer::Scorer;
use crate::libs::stitch::{stitch, CanonicalStream, ScoredOutput};
use anyhow::Context;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Fetches, scores and stitches one job.
pub fn run_job(
    job: &JobDescriptor,
    provider: &dyn SequenceProvider,
    scorer: &dyn Scorer,
) -> anyhow::Result<CanonicalStream> {
    let mut scored: Vec<ScoredOutput> = vec![];

    match &job.unit {
        WorkUnit::Range(r) => {
            let seq = provider.fetch(&r.name, r.fetch_start, r.fetch_end, job.strand)?;
            let label = format!("{}({}):{}-{}", r.name, job.strand, r.fetch_start, r.fetch_end);
            scored.push(scorer.score(&label, &seq)?);
        }
        WorkUnit::Batch(b) => {
            for member in &b.members {
                let seq = provider.fetch(&member.name, 1, member.len, job.strand)?;
                let label = format!("{}({}):1-{}", member.name, job.strand, member.len);
                scored.push(scorer.score(&label, &seq)?);
            }
        }
    }

    Ok(stitch(&scored, &job.unit, job.strand, &job.params)?)
}

/// Writes the artifact under `outdir`.
///
/// Content goes to a temporary file that is renamed into place only when
/// complete, so an interrupted job leaves no artifact behind.
pub fn write_artifact(
    stream: &CanonicalStream,
    job: &JobDescriptor,
    outdir: &Path,
) -> anyhow::Result<PathBuf> {
    let path = outdir.join(job.artifact_name());

    let tmp = tempfile::NamedTempFile::new_in(outdir)
        .with_context(|| format!("could not create a temporary file in {}", outdir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        stream.write_to(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(&path)
        .with_context(|| format!("could not write {}", path.display()))?;

    Ok(path)
}

/// [`run_job`] followed by [`write_artifact`].
pub fn execute_job(
    job: &JobDescriptor,
    provider: &dyn SequenceProvider,
    scorer: &dyn Scorer,
    outdir: &Path,
) -> anyhow::Result<PathBuf> {
    let stream = run_job(job, provider, scorer).with_context(|| format!("job {}", job.label()))?;
    write_artifact(&stream, job, outdir)
}
