//! Common test utilities and helpers

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CATALOG: &str = r#"
data_types:
  - id: "1"
    name: fastq
  - id: "2"
    name: bam
datasets:
  - id: "10"
    name: pilot
    contents:
      - name: S1
        data_type: fastq
        files:
          fastq: files/S1.fastq
      - name: S2
        data_type: fastq
        files:
          fastq: files/S2.fastq
      - name: S1
        data_type: bam
        files:
          bam: files/S1.bam
"#;

pub const PARAMS: &str = r#"
threads: 4
reads:
  datasets: ["10"]
"#;

pub const MANIFEST: &str = r#"
name: rnaseq
source:
  type: local
  template: rnaseq
environment: snakemake
command:
  base: [sh, run.sh]
data:
  - source: reads.datasets
    select:
      - name: fastq
    resolvers:
      fastq: "data/{sample}/reads.fastq"
generators:
  - type: sample_sheet
    file: config/samples.tsv
  - type: yaml
    file: config/config.yaml
"#;

pub const METADATA: &str = "sample,condition\nS1,control\nS2,treated\n";

/// A scratch project: a template, a dataset catalog with its files, a
/// parameter file and a workflow manifest.
pub struct Project {
    temp: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            temp: TempDir::new().unwrap(),
        };
        project.write("templates/rnaseq/Snakefile", "rule all:\n    input: []\n");
        project.write("templates/rnaseq/run.sh", "cat config/samples.tsv\n");
        project.write("files/S1.fastq", "@S1\nACGT\n+\nIIII\n");
        project.write("files/S2.fastq", "@S2\nTTGA\n+\nIIII\n");
        project.write("files/S1.bam", "BAM");
        project.write("catalog.yml", CATALOG);
        project.write("params.yml", PARAMS);
        project.write("manifest.yml", MANIFEST);
        project.write("metadata.csv", METADATA);
        project
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.path("templates")
    }

    pub fn workdir(&self) -> PathBuf {
        self.path("runs/pilot")
    }

    /// A stand-in for `mamba`: lists `align` and `snakemake`, and runs
    /// `run -n <env> [--cwd <dir>] <cmd...>` directly.
    #[cfg(unix)]
    pub fn fake_manager(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = self.write(
            "bin/mamba",
            r#"#!/bin/sh
case "$1" in
  env)
    echo '{"envs": ["/opt/conda", "/opt/conda/envs/align", "/opt/conda/envs/snakemake"]}'
    ;;
  run)
    shift 3
    if [ "$1" = "--cwd" ]; then
      cd "$2" || exit 97
      shift 2
    fi
    exec "$@"
    ;;
  *)
    echo "unsupported: $*" >&2
    exit 2
    ;;
esac
"#,
        );
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }
}

#[cfg(unix)]
pub fn same_inode(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    let (a, b) = (fs::metadata(a).unwrap(), fs::metadata(b).unwrap());
    a.dev() == b.dev() && a.ino() == b.ino()
}
