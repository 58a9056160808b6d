use std::ffi::OsStr;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use anyhow::{Context, Result, bail};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// `CREATE_NO_WINDOW`: keeps PyInstaller and the probes from flashing a console.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// How the packaging subprocess ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A launched PyInstaller process, owned by the build worker thread.
pub trait BuildProcess: Send {
    fn id(&self) -> u32;

    /// Blocks until the process exits, draining its output pipes.
    fn wait(self: Box<Self>) -> Result<ProcessExit>;
}

/// Abstraction for System interactions (processes, trash).
/// This allows us to mock subprocesses and the recycle bin for testing.
pub trait SystemOps: Send + Sync + 'static {
    /// Run a short-lived command and return its exit code.
    ///
    /// Launch failures and timeouts are errors; a non-zero exit is not.
    fn probe(&self, program: &Path, args: &[&str], timeout: Option<Duration>) -> Result<i32>;

    /// Launch the packaging command (`argv[0]` is the interpreter).
    fn spawn_build(&self, argv: &[String]) -> Result<Box<dyn BuildProcess>>;

    /// Direct children of `pid`.
    fn child_pids(&self, pid: u32) -> Result<Vec<u32>>;

    /// Forcefully terminate a single process.
    fn kill_process(&self, pid: u32) -> Result<()>;

    /// Move a file or directory to the recoverable trash.
    fn move_to_trash(&self, path: &Path) -> Result<()>;
}

/// Builds a `Command` that never opens a console window on Windows.
pub fn hidden_command(program: impl AsRef<OsStr>) -> Command {
    let mut command = Command::new(program);
    #[cfg(windows)]
    {
        command.creation_flags(CREATE_NO_WINDOW);
    }
    command
}

/// The Real System implementation (Production).
pub struct HostSystem;

struct ChildProcess(Child);

impl BuildProcess for ChildProcess {
    fn id(&self) -> u32 {
        self.0.id()
    }

    fn wait(self: Box<Self>) -> Result<ProcessExit> {
        let output = self.0.wait_with_output().context("waiting for PyInstaller")?;
        Ok(ProcessExit {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl SystemOps for HostSystem {
    fn probe(&self, program: &Path, args: &[&str], timeout: Option<Duration>) -> Result<i32> {
        let mut child = hidden_command(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("launching {}", program.display()))?;

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.code().unwrap_or(-1));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = child.kill();
                let _ = child.wait();
                bail!("{} did not answer within {:?}", program.display(), timeout);
            }
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    fn spawn_build(&self, argv: &[String]) -> Result<Box<dyn BuildProcess>> {
        let Some((program, args)) = argv.split_first() else {
            bail!("empty build command");
        };
        let child = hidden_command(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("launching {program}"))?;
        Ok(Box::new(ChildProcess(child)))
    }

    fn child_pids(&self, pid: u32) -> Result<Vec<u32>> {
        platform::child_pids(pid)
    }

    fn kill_process(&self, pid: u32) -> Result<()> {
        platform::kill_process(pid)
    }

    fn move_to_trash(&self, path: &Path) -> Result<()> {
        platform::move_to_trash(path)
    }
}

#[cfg(windows)]
mod platform {
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use anyhow::{Result, bail};
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};
    use windows::Win32::UI::Shell::{
        SHFileOperationW, FOF_ALLOWUNDO, FOF_NOCONFIRMATION, FOF_NOERRORUI, FOF_SILENT, FO_DELETE, SHFILEOPSTRUCTW,
    };
    use windows::core::PCWSTR;

    /// Walks a Toolhelp process snapshot and returns every process whose parent is `pid`.
    pub fn child_pids(pid: u32) -> Result<Vec<u32>> {
        let mut children = Vec::new();
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)?;
            let mut entry = PROCESSENTRY32W {
                dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };
            if Process32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    if entry.th32ParentProcessID == pid && entry.th32ProcessID != pid {
                        children.push(entry.th32ProcessID);
                    }
                    if Process32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }
            let _ = CloseHandle(snapshot);
        }
        Ok(children)
    }

    pub fn kill_process(pid: u32) -> Result<()> {
        unsafe {
            let handle = OpenProcess(PROCESS_TERMINATE, false, pid)?;
            let result = TerminateProcess(handle, 1);
            let _ = CloseHandle(handle);
            result?;
        }
        Ok(())
    }

    /// Deletes through the shell with `FOF_ALLOWUNDO`, which lands the item in the Recycle Bin.
    pub fn move_to_trash(path: &Path) -> Result<()> {
        // pFrom is a list of paths terminated by an extra NUL.
        let mut from: Vec<u16> = path.as_os_str().encode_wide().collect();
        from.push(0);
        from.push(0);

        let mut op = SHFILEOPSTRUCTW {
            wFunc: FO_DELETE,
            pFrom: PCWSTR(from.as_ptr()),
            fFlags: (FOF_ALLOWUNDO | FOF_NOCONFIRMATION | FOF_NOERRORUI | FOF_SILENT).0,
            ..Default::default()
        };
        let code = unsafe { SHFileOperationW(&mut op) };
        if code != 0 {
            bail!("SHFileOperationW returned {code:#x}");
        }
        if op.fAnyOperationsAborted.as_bool() {
            bail!("recycle operation was aborted");
        }
        Ok(())
    }
}

#[cfg(not(windows))]
mod platform {
    use std::fs;
    use std::path::Path;
    use anyhow::{Context, Result};
    use super::hidden_command;

    /// Scans `/proc/<pid>/stat` for processes whose parent is `pid`; falls back to `pgrep -P`.
    pub fn child_pids(pid: u32) -> Result<Vec<u32>> {
        let proc_root = Path::new("/proc");
        if !proc_root.is_dir() {
            let output = hidden_command("pgrep").arg("-P").arg(pid.to_string()).output()?;
            return Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter_map(|l| l.trim().parse().ok())
                .collect());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(proc_root)?.filter_map(|e| e.ok()) {
            let Some(candidate) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
                continue;
            };
            let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
                continue;
            };
            // The command name is parenthesised and may contain spaces; fields resume after ')'.
            let Some(rest) = stat.rfind(')').map(|i| &stat[i + 1..]) else {
                continue;
            };
            let parent = rest.split_whitespace().nth(1).and_then(|s| s.parse::<u32>().ok());
            if parent == Some(pid) {
                children.push(candidate);
            }
        }
        Ok(children)
    }

    pub fn kill_process(pid: u32) -> Result<()> {
        let target = libc::pid_t::try_from(pid).with_context(|| format!("pid {pid} out of range"))?;
        if unsafe { libc::kill(target, libc::SIGKILL) } != 0 {
            return Err(std::io::Error::last_os_error()).with_context(|| format!("killing pid {pid}"));
        }
        Ok(())
    }

    /// Freedesktop trash, including the per-mount `.Trash-<uid>` for items on other filesystems.
    pub fn move_to_trash(path: &Path) -> Result<()> {
        trash::delete(path).with_context(|| format!("moving {} to trash", path.display()))
    }
}

#[cfg(test)]
pub use mock::MockSystem;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_exit_success_requires_zero_code() {
        let ok = ProcessExit { code: Some(0), stderr: String::new() };
        let failed = ProcessExit { code: Some(2), stderr: "boom".into() };
        let killed = ProcessExit { code: None, stderr: String::new() };
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn host_probe_reports_launch_failure_as_error() {
        let missing = std::env::temp_dir().join("exe-builder-no-such-interpreter.exe");
        let result = HostSystem.probe(&missing, &["--version"], Some(Duration::from_secs(1)));
        assert!(result.is_err());
    }

    #[test]
    fn host_spawn_rejects_empty_command() {
        assert!(HostSystem.spawn_build(&[]).is_err());
    }

    #[test]
    fn host_trash_of_missing_path_is_an_error() {
        let dir = crate::testutil::Scratch::new("trash-missing");
        let missing = dir.path().join("never-built");
        assert!(HostSystem.move_to_trash(&missing).is_err());
        assert!(!missing.exists());
    }

    #[cfg(unix)]
    #[test]
    fn host_kill_terminates_a_running_process() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        HostSystem.kill_process(child.id()).unwrap();
        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }
}
