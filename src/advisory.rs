//! # Dependency Advisory
//!
//! A best-effort look at the entry script's imports. Anything that is not part of the
//! Python standard library is reported so the user can check it is installed in the
//! interpreter PyInstaller will run under.
//!
//! This is not a Python parser. The scanner splits the source into logical statements
//! (honouring strings, comments, brackets, backslash continuations, `;` and one-line compound
//! statements) and reads the `import` / `from ... import` ones.

use std::collections::BTreeSet;
use std::path::Path;
use log::debug;

/// `sys.stdlib_module_names` of CPython 3.12, plus modules removed since 3.8.
const STDLIB_MODULES: &[&str] = &[
    "__future__", "_abc", "_aix_support", "_ast", "_asyncio", "_bisect", "_blake2", "_bootsubprocess",
    "_bz2", "_codecs", "_codecs_cn", "_codecs_hk", "_codecs_iso2022", "_codecs_jp", "_codecs_kr",
    "_codecs_tw", "_collections", "_collections_abc", "_compat_pickle", "_compression", "_contextvars",
    "_crypt", "_csv", "_ctypes", "_curses", "_curses_panel", "_datetime", "_dbm", "_decimal",
    "_elementtree", "_frozen_importlib", "_frozen_importlib_external", "_functools", "_gdbm", "_hashlib",
    "_heapq", "_imp", "_io", "_json", "_locale", "_lsprof", "_lzma", "_markupbase", "_md5", "_msi",
    "_multibytecodec", "_multiprocessing", "_opcode", "_operator", "_osx_support", "_overlapped",
    "_pickle", "_posixshmem", "_posixsubprocess", "_py_abc", "_pydecimal", "_pyio", "_queue", "_random",
    "_scproxy", "_sha1", "_sha256", "_sha3", "_sha512", "_signal", "_sitebuiltins", "_socket",
    "_sqlite3", "_sre", "_ssl", "_stat", "_statistics", "_string", "_strptime", "_struct", "_symtable",
    "_thread", "_threading_local", "_tkinter", "_tokenize", "_tracemalloc", "_typing", "_uuid",
    "_warnings", "_weakref", "_weakrefset", "_winapi", "_zoneinfo", "abc", "aifc", "antigravity",
    "argparse", "array", "ast", "asynchat", "asyncio", "asyncore", "atexit", "audioop", "base64", "bdb",
    "binascii", "binhex", "bisect", "builtins", "bz2", "cProfile", "calendar", "cgi", "cgitb", "chunk",
    "cmath", "cmd", "code", "codecs", "codeop", "collections", "colorsys", "compileall", "concurrent",
    "configparser", "contextlib", "contextvars", "copy", "copyreg", "crypt", "csv", "ctypes", "curses",
    "dataclasses", "datetime", "dbm", "decimal", "difflib", "dis", "distutils", "doctest", "email",
    "encodings", "ensurepip", "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput",
    "fnmatch", "formatter", "fractions", "ftplib", "functools", "gc", "genericpath", "getopt", "getpass",
    "gettext", "glob", "graphlib", "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http", "idlelib",
    "imaplib", "imghdr", "imp", "importlib", "inspect", "io", "ipaddress", "itertools", "json", "keyword",
    "lib2to3", "linecache", "locale", "logging", "lzma", "mailbox", "mailcap", "marshal", "math",
    "mimetypes", "mmap", "modulefinder", "msilib", "msvcrt", "multiprocessing", "netrc", "nis",
    "nntplib", "nt", "ntpath", "nturl2path", "numbers", "opcode", "operator", "optparse", "os",
    "ossaudiodev", "parser", "pathlib", "pdb", "pickle", "pickletools", "pipes", "pkgutil", "platform",
    "plistlib", "poplib", "posix", "posixpath", "pprint", "profile", "pstats", "pty", "pwd", "py_compile",
    "pyclbr", "pydoc", "pydoc_data", "pyexpat", "queue", "quopri", "random", "re", "readline", "reprlib",
    "resource", "rlcompleter", "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex",
    "shutil", "signal", "site", "smtpd", "smtplib", "sndhdr", "socket", "socketserver", "spwd", "sqlite3",
    "sre_compile", "sre_constants", "sre_parse", "ssl", "stat", "statistics", "string", "stringprep",
    "struct", "subprocess", "sunau", "symbol", "symtable", "sys", "sysconfig", "syslog", "tabnanny",
    "tarfile", "telnetlib", "tempfile", "termios", "textwrap", "this", "threading", "time", "timeit",
    "tkinter", "token", "tokenize", "tomllib", "trace", "traceback", "tracemalloc", "tty", "turtle",
    "turtledemo", "types", "typing", "unicodedata", "unittest", "urllib", "uu", "uuid", "venv",
    "warnings", "wave", "weakref", "webbrowser", "winreg", "winsound", "wsgiref", "xdrlib", "xml",
    "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib", "zoneinfo",
];

/// Statements whose body may follow a `:` on the same line.
const COMPOUND_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "try", "except", "finally", "with", "for", "while", "def", "class", "async",
    "match", "case",
];

pub fn is_stdlib(module: &str) -> bool {
    STDLIB_MODULES.contains(&module)
}

/// Non-stdlib top-level modules imported by `entry_script`, sorted.
///
/// Unreadable or malformed scripts produce an empty list.
pub fn scan(entry_script: &Path) -> Vec<String> {
    let Ok(source) = std::fs::read_to_string(entry_script) else {
        debug!("Advisory: could not read {:?}", entry_script);
        return Vec::new();
    };
    let Some(imports) = extract_imports(&source) else {
        debug!("Advisory: {:?} does not tokenize, skipping", entry_script);
        return Vec::new();
    };
    imports.into_iter().filter(|m| !is_stdlib(m)).collect()
}

/// Top-level module names of every import statement, or `None` when the source has an
/// unterminated string or unbalanced brackets.
pub fn extract_imports(source: &str) -> Option<BTreeSet<String>> {
    let mut imports = BTreeSet::new();
    for statement in logical_statements(source)? {
        collect_statement_imports(&statement, &mut imports);
    }
    Some(imports)
}

fn collect_statement_imports(statement: &str, imports: &mut BTreeSet<String>) {
    let statement = statement.trim();
    if let Some(rest) = strip_keyword(statement, "import") {
        for clause in rest.split(',') {
            if let Some(module) = clause.split_whitespace().next().and_then(top_level) {
                imports.insert(module);
            }
        }
    } else if let Some(rest) = strip_keyword(statement, "from") {
        let Some(module) = rest.split_whitespace().next() else {
            return;
        };
        let has_import = rest.split_whitespace().nth(1) == Some("import");
        if has_import {
            if let Some(module) = top_level(module.trim_start_matches('.')) {
                imports.insert(module);
            }
        }
    }
}

/// `rest` after a leading keyword that is followed by whitespace (or a `.` for `from`).
fn strip_keyword<'a>(statement: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = statement.strip_prefix(keyword)?;
    let boundary = rest.chars().next()?;
    (boundary.is_whitespace() || (keyword == "from" && boundary == '.')).then_some(rest)
}

/// First segment of a dotted name, if it is a valid identifier.
fn top_level(dotted: &str) -> Option<String> {
    let head = dotted.split('.').next()?;
    let mut chars = head.chars();
    let first = chars.next()?;
    let valid = (first.is_alphabetic() || first == '_') && chars.all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| head.to_string())
}

/// Splits source into logical statements with strings and comments blanked out.
fn logical_statements(source: &str) -> Option<Vec<String>> {
    let chars: Vec<char> = source.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut i = 0;

    let flush = |current: &mut String, statements: &mut Vec<String>| {
        if !current.trim().is_empty() {
            statements.push(current.trim().to_string());
        }
        current.clear();
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '\'' | '"' => {
                i = skip_string(&chars, i)?;
                current.push_str(" \"\" ");
                continue;
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                current.push(' ');
                i += 2;
                continue;
            }
            '\\' if chars.get(i + 1) == Some(&'\r') && chars.get(i + 2) == Some(&'\n') => {
                current.push(' ');
                i += 3;
                continue;
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                current.push(c);
            }
            '\n' | '\r' if depth > 0 => current.push(' '),
            '\n' | ';' => flush(&mut current, &mut statements),
            ':' if depth == 0 && starts_compound(&current) => {
                flush(&mut current, &mut statements);
            }
            _ => current.push(c),
        }
        i += 1;
    }

    if depth != 0 {
        return None;
    }
    flush(&mut current, &mut statements);
    Some(statements)
}

fn starts_compound(statement: &str) -> bool {
    statement
        .split_whitespace()
        .next()
        .is_some_and(|word| COMPOUND_KEYWORDS.contains(&word.trim_end_matches(':')))
}

/// Returns the index just past the string literal starting at `start`, or `None` if it
/// never terminates.
fn skip_string(chars: &[char], start: usize) -> Option<usize> {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut i = if triple { start + 3 } else { start + 1 };

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if triple {
            if c == quote && chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return Some(i + 3);
            }
        } else if c == quote {
            return Some(i + 1);
        } else if c == '\n' {
            return None;
        }
        i += 1;
    }
    None
}

/// Fires the advisory once per NOT READY → READY transition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvisoryGate {
    was_ready: bool,
    shown: bool,
}

impl AdvisoryGate {
    /// Feed the latest readiness. `scan` only runs on a transition into READY; the packages it
    /// returns are handed back at most once until readiness is lost again.
    pub fn observe(&mut self, ready: bool, scan: impl FnOnce() -> Vec<String>) -> Option<Vec<String>> {
        if !ready {
            self.shown = false;
        }

        let mut fire = None;
        if ready && !self.was_ready {
            let packages = scan();
            if !packages.is_empty() && !self.shown {
                self.shown = true;
                fire = Some(packages);
            }
        }

        self.was_ready = ready;
        fire
    }
}
