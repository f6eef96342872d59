//! CUPS 后端
//!
//! 通过标准的 `lp*` 命令行工具操作本地打印系统

use std::collections::HashMap;
use std::process::Command;

use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{DiscoveredDevice, JobRecord, JobState, PrinterRecord, PrinterState};
use crate::print_system::{PrintSystem, PrintSystemError, Result};

pub struct CupsCommands {
    discovery_schemes: Vec<String>,
    everywhere_schemes: Vec<String>,
}

impl CupsCommands {
    pub fn new(config: &Config) -> Self {
        Self {
            discovery_schemes: config.discovery_schemes.clone(),
            everywhere_schemes: config.everywhere_schemes.clone(),
        }
    }

    /// 以 C locale 运行命令并返回 stdout
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", program, args.join(" "));
        debug!(%command, "running");

        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|source| PrintSystemError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(%command, status = %output.status, %stderr, "command failed");
            return Err(PrintSystemError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PrintSystem for CupsCommands {
    fn list_printers(&self) -> Result<Vec<PrinterRecord>> {
        let listing = match self.run("lpstat", &["-l", "-p"]) {
            Ok(out) => out,
            // 没有任何队列时 lpstat 以非零状态退出
            Err(PrintSystemError::CommandFailed { stderr, .. })
                if stderr.contains("No destinations") =>
            {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let mut printers = parse_printers(&listing)?;

        // 默认打印机或接收状态取不到不影响列表
        let default = self
            .run("lpstat", &["-d"])
            .ok()
            .and_then(|out| parse_default(&out));
        let accepting = self
            .run("lpstat", &["-a"])
            .map(|out| parse_accepting(&out))
            .unwrap_or_default();

        for p in &mut printers {
            p.is_default = default.as_deref() == Some(p.name.as_str());
            p.accepting_jobs = accepting.get(&p.name).copied().unwrap_or(true);
            if let Some(model) = self
                .run("lpoptions", &["-p", &p.name])
                .ok()
                .and_then(|out| parse_make_and_model(&out))
            {
                p.model = model;
            }
        }
        Ok(printers)
    }

    fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        let listing = self.run("lpstat", &["-l", "-o"])?;
        let mut jobs = parse_jobs(&listing)?;

        if let Ok(queue) = self.run("lpq", &["-a"]) {
            let details = parse_lpq(&queue);
            for job in &mut jobs {
                if let Some((title, active)) = details.get(&job.id) {
                    job.title = title.clone();
                    if *active && job.state == JobState::Pending {
                        job.state = JobState::Processing;
                    }
                }
            }
        }
        Ok(jobs)
    }

    fn set_default(&self, name: &str) -> Result<()> {
        self.run("lpoptions", &["-d", name]).map(|_| ())
    }

    fn delete_printer(&self, name: &str) -> Result<()> {
        self.run("lpadmin", &["-x", name]).map(|_| ())
    }

    fn cancel_job(&self, id: u32) -> Result<()> {
        self.run("cancel", &[&id.to_string()]).map(|_| ())
    }

    fn discover(&self) -> Result<Vec<DiscoveredDevice>> {
        let listing = self.run("lpinfo", &["-v"])?;
        Ok(parse_devices(&listing, &self.discovery_schemes))
    }

    fn add_printer(&self, name: &str, uri: &str) -> Result<()> {
        let device = DiscoveredDevice::from_uri(uri);
        let mut args = vec!["-p", name, "-E", "-v", uri];
        if self.everywhere_schemes.iter().any(|s| s == device.scheme()) {
            args.extend(["-m", "everywhere"]);
        }
        self.run("lpadmin", &args).map(|_| ())
    }
}

/// 解析 `lpstat -l -p`，型号先用描述文字占位
fn parse_printers(out: &str) -> Result<Vec<PrinterRecord>> {
    let mut printers: Vec<PrinterRecord> = Vec::new();

    for line in out.lines() {
        if let Some(rest) = line.strip_prefix("printer ") {
            let mut words = rest.split_whitespace();
            let name = words.next().ok_or_else(|| parse_error("lpstat -l -p", line))?;
            // "is idle." / "now printing office-3." / "disabled since ..."
            let state_word = match words.next() {
                Some("is") => words.next().unwrap_or(""),
                Some(w) => w,
                None => "",
            };
            let mut printer = PrinterRecord::new(name);
            printer.state = PrinterState::from_lpstat(state_word);
            printers.push(printer);
        } else if let Some(current) = printers.last_mut() {
            let detail = line.trim();
            if let Some(desc) = detail.strip_prefix("Description:") {
                current.model = desc.trim().to_string();
            } else if let Some(loc) = detail.strip_prefix("Location:") {
                current.location = loc.trim().to_string();
            }
        }
    }
    Ok(printers)
}

/// 解析 `lpstat -d`
fn parse_default(out: &str) -> Option<String> {
    out.lines()
        .find_map(|l| l.strip_prefix("system default destination:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// 解析 `lpstat -a`
fn parse_accepting(out: &str) -> HashMap<String, bool> {
    out.lines()
        .filter_map(|line| {
            let (name, rest) = line.split_once(' ')?;
            Some((name.to_string(), !rest.starts_with("not ")))
        })
        .collect()
}

/// 解析 `lpstat -l -o`：`<dest>-<id>  <user>  <size>  <date...>`，后跟缩进的详情行
fn parse_jobs(out: &str) -> Result<Vec<JobRecord>> {
    let mut jobs: Vec<JobRecord> = Vec::new();
    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        if line.starts_with(char::is_whitespace) {
            if let (Some(job), Some(reasons)) =
                (jobs.last_mut(), line.trim().strip_prefix("Alerts:"))
            {
                job.state = JobState::from_reasons(reasons);
            }
            continue;
        }

        let mut cols = line.split_whitespace();
        let (Some(dest_id), Some(user), Some(size)) = (cols.next(), cols.next(), cols.next())
        else {
            return Err(parse_error("lpstat -l -o", line));
        };
        let (printer, id) = dest_id
            .rsplit_once('-')
            .and_then(|(p, id)| Some((p, id.parse::<u32>().ok()?)))
            .ok_or_else(|| parse_error("lpstat -l -o", line))?;

        jobs.push(JobRecord {
            id,
            printer: printer.to_string(),
            title: String::new(),
            user: user.to_string(),
            size: size.parse().unwrap_or(0),
            state: JobState::Pending,
        });
    }
    Ok(jobs)
}

/// 解析 `lpq -a`：作业 id -> (标题, 是否正在打印)
fn parse_lpq(out: &str) -> HashMap<u32, (String, bool)> {
    let mut details = HashMap::new();
    for line in out.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        // rank owner job file(s)... size "bytes"
        if cols.len() < 6 || cols[cols.len() - 1] != "bytes" {
            continue;
        }
        let Ok(id) = cols[2].parse::<u32>() else {
            continue;
        };
        let title = cols[3..cols.len() - 2].join(" ");
        details.insert(id, (title, cols[0] == "active"));
    }
    details
}

/// 解析 `lpinfo -v`，只保留协议在白名单内的网络设备
fn parse_devices(out: &str, schemes: &[String]) -> Vec<DiscoveredDevice> {
    let mut devices: Vec<DiscoveredDevice> = Vec::new();
    for line in out.lines() {
        let Some(uri) = line.strip_prefix("network ").map(str::trim) else {
            continue;
        };
        // "network socket" 这类只有后端名的行不是设备
        let Some((scheme, _)) = uri.split_once("://") else {
            continue;
        };
        if !schemes.iter().any(|s| s == scheme) {
            continue;
        }
        if devices.iter().any(|d| d.uri == uri) {
            continue;
        }
        devices.push(DiscoveredDevice::from_uri(uri));
    }
    devices
}

/// 从 `lpoptions -p <name>` 中取出 `printer-make-and-model` 的值
///
/// 值可能用单引号或双引号包起来，也可能用反斜杠转义空格。
fn parse_make_and_model(out: &str) -> Option<String> {
    const KEY: &str = "printer-make-and-model=";
    let start = out
        .match_indices(KEY)
        .find(|(i, _)| *i == 0 || out[..*i].ends_with(char::is_whitespace))
        .map(|(i, _)| i + KEY.len())?;

    let mut chars = out[start..].chars();
    let mut value = String::new();
    let mut quote = None;
    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', _) => value.extend(chars.next()),
            ('\'' | '"', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (c, None) if c.is_whitespace() => break,
            (c, _) => value.push(c),
        }
    }

    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

fn parse_error(command: &str, line: &str) -> PrintSystemError {
    PrintSystemError::Parse {
        command: command.to_string(),
        line: line.to_string(),
    }
}
