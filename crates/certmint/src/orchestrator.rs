//! Mode planning and the install/uninstall orchestrator.
//!
//! Options are validated into an ordered operation plan before anything
//! touches the filesystem, so rejected combinations have zero side
//! effects. The orchestrator then drives the trust-store backends in a
//! fixed sequence (system, then NSS, then Java) and isolates per-backend
//! subprocess failures so one broken helper does not abort the run.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::{debug, warn};

use certmint_ca::{
    classify_all, issue, wildcard_advisories, CaAuthority, CsrRequest, IssueRequest, IssuedBundle,
    KeyAlgorithm, OutputPaths, SubjectRequest,
};
use certmint_trust::{
    Availability, CaCert, JavaStore, NssStore, PrivilegeGate, SystemStore, TrustError, TrustStore,
};

use crate::caroot::caroot;
use crate::error::{Error, Result};

/// Parsed front-end options, before planning.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Install the CA into the enabled trust stores
    pub install: bool,
    /// Detach the CA from the enabled trust stores
    pub uninstall: bool,
    /// Print the CA storage location and exit
    pub caroot_query: bool,
    /// Issue from this CSR file instead of from subjects
    pub csr: Option<PathBuf>,
    /// Raw subject arguments
    pub subjects: Vec<String>,
    /// Use an ECDSA leaf key instead of the RSA default
    pub ecdsa: bool,
    /// Add the ClientAuth extended key usage
    pub client: bool,
    /// Emit a PKCS#12 bundle instead of the PEM pair
    pub pkcs12: bool,
    /// Certificate output override
    pub cert_file: Option<PathBuf>,
    /// Key output override
    pub key_file: Option<PathBuf>,
    /// PKCS#12 output override
    pub p12_file: Option<PathBuf>,
    /// Enablement default when `TRUST_STORES` is unset (from the config
    /// file)
    pub trust_stores: Option<Vec<String>>,
}

/// One step of an invocation.
///
/// Chaining is explicit: the only legal multi-step plan is Install followed
/// by one issuance step. Uninstall always runs alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Print the resolved CAROOT
    CarootQuery,
    /// Install the CA into the enabled trust stores
    Install,
    /// Detach the CA from the enabled trust stores
    Uninstall,
    /// Issue a leaf certificate for the positional subjects
    IssueFromSubjects,
    /// Issue a leaf certificate for the supplied CSR
    IssueFromCsr,
}

/// Validate options into an ordered operation plan.
///
/// Pure: nothing is read or written, so a rejected combination leaves no
/// partial state anywhere.
///
/// # Errors
///
/// Returns a configuration error for every illegal combination.
pub fn plan(options: &Options) -> Result<Vec<Operation>> {
    if options.caroot_query {
        if options.install || options.uninstall {
            return Err(Error::CarootWithMode);
        }
        return Ok(vec![Operation::CarootQuery]);
    }
    if options.install && options.uninstall {
        return Err(Error::InstallAndUninstall);
    }
    if options.csr.is_some() {
        if options.pkcs12
            || options.ecdsa
            || options.client
            || options.key_file.is_some()
            || options.p12_file.is_some()
        {
            return Err(Error::CsrWithIssuanceFlags);
        }
        if !options.subjects.is_empty() {
            return Err(Error::CsrWithSubjects);
        }
    }
    if options.uninstall {
        return Ok(vec![Operation::Uninstall]);
    }
    let mut operations = Vec::new();
    if options.install {
        operations.push(Operation::Install);
    }
    if options.csr.is_some() {
        operations.push(Operation::IssueFromCsr);
    } else if !options.subjects.is_empty() {
        operations.push(Operation::IssueFromSubjects);
    } else if operations.is_empty() {
        return Err(Error::NoSubjects);
    }
    Ok(operations)
}

/// Which trust-store backends this run may consult.
#[derive(Debug, Clone, Default)]
pub struct Enablement {
    allowed: Option<Vec<String>>,
}

impl Enablement {
    /// Everything enabled.
    pub const fn all() -> Self {
        Self { allowed: None }
    }

    /// Restrict to an explicit list.
    pub fn from_list<I, S>(list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = list
            .into_iter()
            .map(Into::into)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if allowed.is_empty() {
            Self::all()
        } else {
            Self {
                allowed: Some(allowed),
            }
        }
    }

    /// Derive the set once per run: the `TRUST_STORES` environment variable
    /// wins, then the config-file default, then all-enabled.
    pub fn resolve(config_default: Option<&[String]>) -> Self {
        match std::env::var("TRUST_STORES") {
            Ok(raw) if !raw.is_empty() => Self::from_list(raw.split(',')),
            _ => config_default.map_or_else(Self::all, |list| Self::from_list(list.iter().cloned())),
        }
    }

    /// Whether a backend may be consulted.
    pub fn enabled(&self, name: &str) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |list| list.iter().any(|entry| entry == name))
    }
}

/// Drives the CA authority and the trust-store backends through one
/// invocation.
pub struct Orchestrator {
    authority: CaAuthority,
    stores: Vec<Box<dyn TrustStore>>,
    enablement: Enablement,
    gate: PrivilegeGate,
    // A freshly updated OS root cache is not guaranteed to be visible to
    // this process, so the system store is not re-checked after we install
    // into it within the same run.
    system_check_suppressed: bool,
    installed_this_run: bool,
}

impl Orchestrator {
    /// Resolve CAROOT, load or create the CA, and probe the backends.
    ///
    /// # Errors
    ///
    /// Fails when no CAROOT can be resolved or the CA cannot be
    /// materialized; both are fatal for the whole run.
    pub fn new(options: &Options) -> Result<Self> {
        let root = caroot().ok_or(Error::CarootUnresolved)?;
        Self::with_caroot(&root, Enablement::resolve(options.trust_stores.as_deref()))
    }

    /// Construct against an explicit CAROOT and enablement set.
    pub fn with_caroot(root: &Path, enablement: Enablement) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| Error::CarootCreate {
            path: root.to_path_buf(),
            source: e,
        })?;
        let authority = CaAuthority::load_or_create(root)?;
        if authority.was_created() {
            eprintln!(
                "Created a new local CA at \"{}\"",
                root.display()
            );
        }
        Ok(Self {
            authority,
            stores: vec![
                Box::new(SystemStore::probe()),
                Box::new(NssStore::probe()),
                Box::new(JavaStore::probe()),
            ],
            enablement,
            gate: PrivilegeGate::new(),
            system_check_suppressed: false,
            installed_this_run: false,
        })
    }

    /// The authority backing this run.
    pub fn authority(&self) -> &CaAuthority {
        &self.authority
    }

    /// Execute a validated operation plan.
    ///
    /// # Errors
    ///
    /// CA file I/O and issuance failures abort the run; per-backend
    /// subprocess failures are logged and skipped.
    pub fn run(&mut self, operations: &[Operation], options: &Options) -> Result<()> {
        for operation in operations {
            match operation {
                Operation::CarootQuery => {
                    println!("{}", self.authority.root().display());
                }
                Operation::Install => self.install_stores(),
                Operation::Uninstall => self.uninstall_stores(),
                Operation::IssueFromSubjects => self.issue_from_subjects(options)?,
                Operation::IssueFromCsr => self.issue_from_csr(options)?,
            }
        }
        Ok(())
    }

    fn ca_cert(&self) -> CaCert {
        CaCert {
            pem_path: self.authority.cert_path(),
            pem: self.authority.cert_pem().to_string(),
            der: self.authority.cert_der().to_vec(),
            nickname: self.authority.nickname(),
        }
    }

    fn install_stores(&mut self) {
        self.installed_this_run = true;
        let ca = self.ca_cert();
        for name in ["system", "nss", "java"] {
            let Some(index) = self.stores.iter().position(|store| store.name() == name) else {
                continue;
            };
            let store = &self.stores[index];
            if !self.enablement.enabled(name) {
                debug!(store = name, "store disabled by TRUST_STORES");
                continue;
            }
            if let Availability::NotApplicable(reason) = store.availability() {
                debug!(store = name, %reason, "skipping unavailable trust store");
                continue;
            }
            let description = store.description();
            let already = (name == "system" && self.system_check_suppressed)
                || match store.is_installed(&ca) {
                    Ok(trusted) => trusted,
                    Err(e) => {
                        warn!(store = name, error = %e, "trust check failed");
                        false
                    }
                };
            if already {
                eprintln!("The local CA is already installed in {description}!");
                continue;
            }
            match store.install(&ca, &mut self.gate) {
                Ok(()) => {
                    if name == "system" {
                        self.system_check_suppressed = true;
                    }
                    if name == "nss" {
                        eprintln!(
                            "The local CA is now installed in {description} (requires browser restart)!"
                        );
                    } else {
                        eprintln!("The local CA is now installed in {description}!");
                    }
                }
                Err(TrustError::MissingTool { tool, hint }) => {
                    eprintln!(
                        "{}",
                        format!(
                            "Warning: \"{tool}\" is not available, so the CA can't be automatically installed in {description}!"
                        )
                        .yellow()
                    );
                    if let Some(hint) = hint {
                        eprintln!(
                            "Install \"{tool}\" with \"{hint}\" and re-run \"certmint --install\""
                        );
                    }
                }
                Err(err) => {
                    // Fatal for this backend only; the next one still runs
                    eprintln!("{}", format!("ERROR: {err}").red());
                }
            }
        }
        eprintln!();
    }

    fn uninstall_stores(&mut self) {
        let ca = self.ca_cert();
        // Browser and Java stores detach first, the system store last.
        // Trust is never re-checked afterwards and the CA files stay put.
        for name in ["nss", "java", "system"] {
            let Some(index) = self.stores.iter().position(|store| store.name() == name) else {
                continue;
            };
            let store = &self.stores[index];
            if !self.enablement.enabled(name) {
                continue;
            }
            if let Availability::NotApplicable(reason) = store.availability() {
                debug!(store = name, %reason, "skipping unavailable trust store");
                continue;
            }
            let description = store.description();
            match store.uninstall(&ca, &mut self.gate) {
                Ok(()) => {
                    eprintln!("The local CA is now uninstalled from {description}!");
                }
                Err(TrustError::MissingTool { tool, hint }) => {
                    eprintln!(
                        "{}",
                        format!(
                            "Warning: \"{tool}\" is not available, so the CA can't be automatically uninstalled from {description} (if it was ever installed)!"
                        )
                        .yellow()
                    );
                    if let Some(hint) = hint {
                        eprintln!(
                            "You can install \"{tool}\" with \"{hint}\" and re-run \"certmint --uninstall\""
                        );
                    }
                }
                Err(err) => {
                    eprintln!("{}", format!("ERROR: {err}").red());
                }
            }
        }
        eprintln!();
    }

    /// In plain issuance mode, point out stores that do not trust the CA
    /// yet. Warnings only; issuance proceeds either way.
    fn warn_if_untrusted(&self) {
        if self.installed_this_run {
            return;
        }
        let ca = self.ca_cert();
        let mut warned = false;
        for store in &self.stores {
            if !self.enablement.enabled(store.name()) {
                continue;
            }
            if matches!(store.availability(), Availability::NotApplicable(_)) {
                continue;
            }
            let trusted = (store.name() == "system" && self.system_check_suppressed)
                || store.is_installed(&ca).unwrap_or(false);
            if !trusted {
                warned = true;
                eprintln!(
                    "Note: the local CA is not installed in {}.",
                    store.description()
                );
            }
        }
        if warned {
            eprintln!(
                "{}",
                "Run \"certmint --install\" for certificates to be trusted automatically."
                    .yellow()
            );
        }
    }

    fn issue_from_subjects(&mut self, options: &Options) -> Result<()> {
        self.warn_if_untrusted();
        let subjects = classify_all(&options.subjects)?;
        for line in wildcard_advisories(&subjects) {
            eprintln!("{}", line.yellow());
        }
        let request = IssueRequest::Subjects(SubjectRequest {
            subjects,
            algorithm: if options.ecdsa {
                KeyAlgorithm::EcdsaP256
            } else {
                KeyAlgorithm::Rsa2048
            },
            client: options.client,
            pkcs12: options.pkcs12,
            output: OutputPaths {
                cert: options.cert_file.clone(),
                key: options.key_file.clone(),
                p12: options.p12_file.clone(),
            },
        });
        let bundle = issue(&self.authority, &request)?;
        report(&bundle);
        Ok(())
    }

    fn issue_from_csr(&mut self, options: &Options) -> Result<()> {
        self.warn_if_untrusted();
        let Some(path) = &options.csr else {
            // plan() never emits IssueFromCsr without a CSR path
            return Err(Error::NoSubjects);
        };
        let csr_pem = std::fs::read_to_string(path).map_err(|e| Error::CsrRead {
            path: path.clone(),
            source: e,
        })?;
        let request = IssueRequest::Csr(CsrRequest {
            csr_pem,
            output: OutputPaths {
                cert: options.cert_file.clone(),
                ..OutputPaths::default()
            },
        });
        let bundle = issue(&self.authority, &request)?;
        report(&bundle);
        Ok(())
    }
}

fn report(bundle: &IssuedBundle) {
    eprintln!();
    if bundle.names.len() == 1 {
        eprintln!("Created a new certificate valid for the following name:");
    } else {
        eprintln!("Created a new certificate valid for the following names:");
    }
    for name in &bundle.names {
        eprintln!(" - {name:?}");
    }
    eprintln!();
    match (&bundle.cert_path, &bundle.key_path, &bundle.p12_path) {
        (_, _, Some(p12)) => {
            eprintln!("The PKCS#12 bundle is at \"{}\"", p12.display());
            eprintln!(
                "The legacy PKCS#12 encryption password is the often hardcoded default {:?}",
                certmint_ca::P12_PASSWORD
            );
        }
        (Some(cert), Some(key), None) => {
            eprintln!(
                "The certificate is at \"{}\" and the key at \"{}\"",
                cert.display(),
                key.display()
            );
        }
        (Some(cert), None, None) => {
            eprintln!("The certificate is at \"{}\"", cert.display());
        }
        _ => {}
    }
    eprintln!("It will expire on {}", bundle.not_after.date());
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn subjects(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    /// Backend double whose state survives across orchestrator instances,
    /// standing in for a persistent trust store.
    struct MockStore {
        store_name: &'static str,
        installed: Rc<Cell<bool>>,
        checks: Rc<Cell<usize>>,
        installs: Rc<Cell<usize>>,
        fail_install: bool,
    }

    impl MockStore {
        fn boxed(
            store_name: &'static str,
            installed: &Rc<Cell<bool>>,
            checks: &Rc<Cell<usize>>,
            installs: &Rc<Cell<usize>>,
            fail_install: bool,
        ) -> Box<dyn TrustStore> {
            Box::new(Self {
                store_name,
                installed: Rc::clone(installed),
                checks: Rc::clone(checks),
                installs: Rc::clone(installs),
                fail_install,
            })
        }
    }

    impl TrustStore for MockStore {
        fn name(&self) -> &'static str {
            self.store_name
        }

        fn description(&self) -> String {
            format!("the {} trust store", self.store_name)
        }

        fn availability(&self) -> Availability {
            Availability::Available
        }

        fn is_installed(&self, _ca: &CaCert) -> certmint_trust::Result<bool> {
            self.checks.set(self.checks.get() + 1);
            Ok(self.installed.get())
        }

        fn install(
            &self,
            _ca: &CaCert,
            _gate: &mut PrivilegeGate,
        ) -> certmint_trust::Result<()> {
            if self.fail_install {
                return Err(TrustError::Command {
                    command: "mock-install".to_string(),
                    detail: "exited with exit status: 1".to_string(),
                    output: String::new(),
                });
            }
            self.installs.set(self.installs.get() + 1);
            self.installed.set(true);
            Ok(())
        }

        fn uninstall(
            &self,
            _ca: &CaCert,
            _gate: &mut PrivilegeGate,
        ) -> certmint_trust::Result<()> {
            self.installed.set(false);
            Ok(())
        }
    }

    fn mock_orchestrator(caroot: &TempDir, stores: Vec<Box<dyn TrustStore>>) -> Orchestrator {
        Orchestrator {
            authority: CaAuthority::load_or_create(caroot.path()).unwrap(),
            stores,
            enablement: Enablement::all(),
            gate: PrivilegeGate::new(),
            system_check_suppressed: false,
            installed_this_run: false,
        }
    }

    #[test]
    fn test_second_install_run_sees_already_installed() {
        let caroot = TempDir::new().unwrap();
        let installed = Rc::new(Cell::new(false));
        let checks = Rc::new(Cell::new(0));
        let installs = Rc::new(Cell::new(0));

        let mut first = mock_orchestrator(
            &caroot,
            vec![MockStore::boxed("nss", &installed, &checks, &installs, false)],
        );
        first.install_stores();
        assert!(installed.get());
        assert_eq!(installs.get(), 1);

        let mut second = mock_orchestrator(
            &caroot,
            vec![MockStore::boxed("nss", &installed, &checks, &installs, false)],
        );
        second.install_stores();
        // Already trusted: the second run never mutates the store again
        assert_eq!(installs.get(), 1);
    }

    #[test]
    fn test_system_recheck_is_suppressed_after_install() {
        let caroot = TempDir::new().unwrap();
        let installed = Rc::new(Cell::new(false));
        let checks = Rc::new(Cell::new(0));
        let installs = Rc::new(Cell::new(0));

        let mut orchestrator = mock_orchestrator(
            &caroot,
            vec![MockStore::boxed(
                "system", &installed, &checks, &installs, false,
            )],
        );
        orchestrator.install_stores();
        assert!(orchestrator.system_check_suppressed);
        let checks_after_install = checks.get();

        // The same-run warning pass must not consult the system store again
        orchestrator.installed_this_run = false;
        orchestrator.warn_if_untrusted();
        assert_eq!(checks.get(), checks_after_install);
    }

    #[test]
    fn test_backend_failure_does_not_abort_the_run() {
        let caroot = TempDir::new().unwrap();
        let sys_installed = Rc::new(Cell::new(false));
        let nss_installed = Rc::new(Cell::new(false));
        let checks = Rc::new(Cell::new(0));
        let installs = Rc::new(Cell::new(0));

        let mut orchestrator = mock_orchestrator(
            &caroot,
            vec![
                MockStore::boxed("system", &sys_installed, &checks, &installs, true),
                MockStore::boxed("nss", &nss_installed, &checks, &installs, false),
            ],
        );
        orchestrator.install_stores();

        // The failing system backend is isolated; NSS still proceeds
        assert!(!sys_installed.get());
        assert!(!orchestrator.system_check_suppressed);
        assert!(nss_installed.get());
    }

    #[test]
    fn test_uninstall_detaches_without_rechecking_or_deleting_ca() {
        let caroot = TempDir::new().unwrap();
        let installed = Rc::new(Cell::new(true));
        let checks = Rc::new(Cell::new(0));
        let installs = Rc::new(Cell::new(0));

        let mut orchestrator = mock_orchestrator(
            &caroot,
            vec![MockStore::boxed(
                "system", &installed, &checks, &installs, false,
            )],
        );
        orchestrator.uninstall_stores();

        assert!(!installed.get());
        assert_eq!(checks.get(), 0);
        assert!(caroot.path().join("rootCA.pem").exists());
        assert!(caroot.path().join("rootCA-key.pem").exists());
    }

    #[test]
    fn test_disabled_store_is_never_consulted() {
        let caroot = TempDir::new().unwrap();
        let installed = Rc::new(Cell::new(false));
        let checks = Rc::new(Cell::new(0));
        let installs = Rc::new(Cell::new(0));

        let mut orchestrator = mock_orchestrator(
            &caroot,
            vec![MockStore::boxed(
                "java", &installed, &checks, &installs, false,
            )],
        );
        orchestrator.enablement = Enablement::from_list(["system"]);
        orchestrator.install_stores();

        assert_eq!(checks.get(), 0);
        assert_eq!(installs.get(), 0);
    }

    #[test]
    fn test_plan_single_modes() {
        let install = Options {
            install: true,
            ..Options::default()
        };
        assert_eq!(plan(&install).unwrap(), vec![Operation::Install]);

        let uninstall = Options {
            uninstall: true,
            ..Options::default()
        };
        assert_eq!(plan(&uninstall).unwrap(), vec![Operation::Uninstall]);

        let caroot_query = Options {
            caroot_query: true,
            ..Options::default()
        };
        assert_eq!(plan(&caroot_query).unwrap(), vec![Operation::CarootQuery]);
    }

    #[test]
    fn test_plan_issue_modes() {
        let from_subjects = Options {
            subjects: subjects(&["example.org"]),
            ..Options::default()
        };
        assert_eq!(
            plan(&from_subjects).unwrap(),
            vec![Operation::IssueFromSubjects]
        );

        let from_csr = Options {
            csr: Some(PathBuf::from("req.pem")),
            ..Options::default()
        };
        assert_eq!(plan(&from_csr).unwrap(), vec![Operation::IssueFromCsr]);
    }

    #[test]
    fn test_plan_install_chains_with_issuance() {
        let chained = Options {
            install: true,
            subjects: subjects(&["example.org"]),
            ..Options::default()
        };
        assert_eq!(
            plan(&chained).unwrap(),
            vec![Operation::Install, Operation::IssueFromSubjects]
        );

        let with_csr = Options {
            install: true,
            csr: Some(PathBuf::from("req.pem")),
            ..Options::default()
        };
        assert_eq!(
            plan(&with_csr).unwrap(),
            vec![Operation::Install, Operation::IssueFromCsr]
        );
    }

    #[test]
    fn test_plan_uninstall_never_chains() {
        let options = Options {
            uninstall: true,
            subjects: subjects(&["example.org"]),
            ..Options::default()
        };
        assert_eq!(plan(&options).unwrap(), vec![Operation::Uninstall]);
    }

    #[test]
    fn test_plan_rejects_install_with_uninstall() {
        let options = Options {
            install: true,
            uninstall: true,
            ..Options::default()
        };
        assert!(matches!(plan(&options), Err(Error::InstallAndUninstall)));
    }

    #[test]
    fn test_plan_rejects_caroot_with_modes() {
        let options = Options {
            caroot_query: true,
            install: true,
            ..Options::default()
        };
        assert!(matches!(plan(&options), Err(Error::CarootWithMode)));
    }

    #[test]
    fn test_plan_rejects_csr_with_issuance_flags() {
        let mutations: [fn(&mut Options); 5] = [
            |o| o.ecdsa = true,
            |o| o.client = true,
            |o| o.pkcs12 = true,
            |o| o.key_file = Some(PathBuf::from("k.pem")),
            |o| o.p12_file = Some(PathBuf::from("b.p12")),
        ];
        for mutate in mutations {
            let mut options = Options {
                csr: Some(PathBuf::from("req.pem")),
                ..Options::default()
            };
            mutate(&mut options);
            assert!(matches!(plan(&options), Err(Error::CsrWithIssuanceFlags)));
        }
    }

    #[test]
    fn test_plan_rejects_csr_with_subjects() {
        let options = Options {
            csr: Some(PathBuf::from("req.pem")),
            subjects: subjects(&["example.org"]),
            ..Options::default()
        };
        assert!(matches!(plan(&options), Err(Error::CsrWithSubjects)));
    }

    #[test]
    fn test_plan_rejects_empty_invocation() {
        assert!(matches!(plan(&Options::default()), Err(Error::NoSubjects)));
    }

    #[test]
    fn test_enablement_defaults_to_all() {
        let all = Enablement::all();
        assert!(all.enabled("system"));
        assert!(all.enabled("nss"));
        assert!(all.enabled("java"));
    }

    #[test]
    fn test_enablement_restricts_to_list() {
        let only_system = Enablement::from_list(["system"]);
        assert!(only_system.enabled("system"));
        assert!(!only_system.enabled("nss"));
        assert!(!only_system.enabled("java"));
    }

    #[test]
    fn test_enablement_trims_and_ignores_empties() {
        let set = Enablement::from_list([" system ", ""]);
        assert!(set.enabled("system"));
        assert!(!set.enabled("java"));
    }

    #[test]
    fn test_orchestrator_issues_into_explicit_paths() {
        let caroot = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut orchestrator =
            Orchestrator::with_caroot(caroot.path(), Enablement::from_list(["system"])).unwrap();
        let options = Options {
            subjects: subjects(&["example.org"]),
            ecdsa: true,
            cert_file: Some(out.path().join("example.org.pem")),
            key_file: Some(out.path().join("example.org-key.pem")),
            ..Options::default()
        };
        let operations = plan(&options).unwrap();
        orchestrator.run(&operations, &options).unwrap();

        assert!(out.path().join("example.org.pem").exists());
        assert!(out.path().join("example.org-key.pem").exists());
        assert!(caroot.path().join("rootCA.pem").exists());
        assert!(caroot.path().join("rootCA-key.pem").exists());
    }

    #[test]
    fn test_invalid_subject_aborts_before_writing() {
        let caroot = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut orchestrator =
            Orchestrator::with_caroot(caroot.path(), Enablement::from_list(["system"])).unwrap();
        let options = Options {
            subjects: subjects(&["example.org", "*bad.example"]),
            ecdsa: true,
            cert_file: Some(out.path().join("out.pem")),
            key_file: Some(out.path().join("out-key.pem")),
            ..Options::default()
        };
        let operations = plan(&options).unwrap();
        assert!(orchestrator.run(&operations, &options).is_err());
        assert!(!out.path().join("out.pem").exists());
        assert!(!out.path().join("out-key.pem").exists());
    }
}
