//! Builders for the cluster command output formats
//!
//! These produce text in the shape the engine parses so tests don't have
//! to hand-align columns.

/// Builder for `bhosts -w` style status listings
#[derive(Debug, Clone, Default)]
pub struct BhostsOutputBuilder {
    header: bool,
    rows: Vec<(String, String)>,
}

impl BhostsOutputBuilder {
    pub fn new() -> Self {
        Self {
            header: true,
            rows: Vec::new(),
        }
    }

    /// Omit the header line (`bhosts -w -noheader`)
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }

    pub fn host(mut self, hostname: &str, status: &str) -> Self {
        self.rows.push((hostname.to_string(), status.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        if self.header {
            lines.push(
                "HOST_NAME                       STATUS          JL/U    MAX  NJOBS    RUN  SSUSP  USUSP    RSV"
                    .to_string(),
            );
        }
        for (hostname, status) in self.rows {
            lines.push(format!(
                "{hostname:<31} {status:<15} -       8      0      0      0      0      0"
            ));
        }
        lines.join("\n")
    }
}

/// Builder for `bjobs -a` style job listings
#[derive(Debug, Clone, Default)]
pub struct BjobsOutputBuilder {
    rows: Vec<(String, String, String)>,
}

impl BjobsOutputBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `user` is truncated to the seven characters `bjobs` displays
    pub fn job(mut self, id: &str, user: &str, state: &str) -> Self {
        let user: String = user.chars().take(7).collect();
        self.rows
            .push((id.to_string(), user, state.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut lines = vec![
            "JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME".to_string(),
        ];
        for (id, user, state) in self.rows {
            lines.push(format!(
                "{id:<7} {user:<7} {state:<5} normal     hpc-login   hpc-comp    myjob[1]   Oct 19 10:00"
            ));
        }
        lines.join("\n")
    }
}

/// `lsid` output naming the given master
pub fn lsid_output(master: &str) -> String {
    format!(
        "IBM Spectrum LSF Standard 10.1.0.14, Jan 01 2024\n\
         Copyright International Business Machines Corp. 1992, 2016.\n\n\
         My cluster name is hpc-cluster\n\
         My master name is {master}\n"
    )
}

/// `bsub` acknowledgement for the given job id
pub fn bsub_output(job_id: &str) -> String {
    format!("Job <{job_id}> is submitted to default queue <normal>.")
}
