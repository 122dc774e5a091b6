//! C FFI bindings for sheetcmp-core
//!
//! This crate provides a C-compatible API around a comparison session, for use
//! from C/C++ or other UI hosts. Tables are addressed by kind index:
//! 0 = file 1, 1 = file 2, 2 = common rows, 3 = unique to file 1,
//! 4 = unique to file 2.

use log::warn;
use sheetcmp_core::{ExportOptions, LoadOptions, NormalizeOptions, Session, Side, Table, TableKind};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

/// Opaque handle to a comparison session
pub struct FfiSession {
    inner: Session,
    last_error: Option<String>,
}

impl FfiSession {
    fn table(&self, kind: usize) -> Option<&Table> {
        TableKind::ALL.get(kind).and_then(|k| self.inner.table(*k))
    }

    fn fail(&mut self, message: String) -> i32 {
        warn!("{}", message);
        self.last_error = Some(message);
        -1
    }
}

unsafe fn to_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        None
    } else {
        CStr::from_ptr(s).to_str().ok()
    }
}

/// Null when `s` holds a NUL byte
fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Create an empty session with default comparison settings
#[no_mangle]
pub extern "C" fn sc_session_new() -> *mut FfiSession {
    Box::into_raw(Box::new(FfiSession {
        inner: Session::new(NormalizeOptions::default()),
        last_error: None,
    }))
}

/// Free a session
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new` or null
#[no_mangle]
pub unsafe extern "C" fn sc_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

unsafe fn load_side(
    session: *mut FfiSession,
    side: Side,
    path: *const c_char,
    sheet: *const c_char,
) -> i32 {
    let Some(session) = session.as_mut() else {
        return -1;
    };
    let Some(path) = to_str(path) else {
        return session.fail("path is null or not UTF-8".to_string());
    };
    let sheet = if sheet.is_null() {
        None
    } else {
        match to_str(sheet) {
            Some(name) => Some(name.to_string()),
            None => return session.fail("sheet name is not UTF-8".to_string()),
        }
    };
    let options = LoadOptions { sheet };

    if let Err(e) = session.inner.load(side, Path::new(path), &options) {
        return session.fail(e.to_string());
    }
    match session.inner.reconcile() {
        Ok(_) => {
            session.last_error = None;
            0
        }
        Err(e) => session.fail(e.to_string()),
    }
}

/// Load file 1, reconciling if file 2 is already loaded
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - `path` must be a valid C string
/// - `sheet` must be a valid C string, or null for the first sheet
/// - Returns 0 on success, -1 on error
#[no_mangle]
pub unsafe extern "C" fn sc_load_left(
    session: *mut FfiSession,
    path: *const c_char,
    sheet: *const c_char,
) -> i32 {
    load_side(session, Side::Left, path, sheet)
}

/// Load file 2, reconciling if file 1 is already loaded
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - `path` must be a valid C string
/// - `sheet` must be a valid C string, or null for the first sheet
/// - Returns 0 on success, -1 on error
#[no_mangle]
pub unsafe extern "C" fn sc_load_right(
    session: *mut FfiSession,
    path: *const c_char,
    sheet: *const c_char,
) -> i32 {
    load_side(session, Side::Right, path, sheet)
}

/// Get the message of the last failed call
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - Returns null if the last call succeeded
/// - Caller must free the returned string with `sc_free_string`
#[no_mangle]
pub unsafe extern "C" fn sc_last_error(session: *const FfiSession) -> *mut c_char {
    match session.as_ref().and_then(|s| s.last_error.as_deref()) {
        Some(message) => into_c_string(message),
        None => ptr::null_mut(),
    }
}

/// Get the row count of a table
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - Returns -1 if the table is not available
#[no_mangle]
pub unsafe extern "C" fn sc_table_row_count(session: *const FfiSession, kind: usize) -> i64 {
    session
        .as_ref()
        .and_then(|s| s.table(kind))
        .and_then(|t| i64::try_from(t.row_count()).ok())
        .unwrap_or(-1)
}

/// Get the column count of a table
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - Returns -1 if the table is not available
#[no_mangle]
pub unsafe extern "C" fn sc_table_col_count(session: *const FfiSession, kind: usize) -> i64 {
    session
        .as_ref()
        .and_then(|s| s.table(kind))
        .and_then(|t| i64::try_from(t.column_count()).ok())
        .unwrap_or(-1)
}

/// Get a column name by index
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - Returns null if the table is not available or index is out of bounds
/// - Also returns null for a name containing a NUL byte
/// - Caller must free the returned string with `sc_free_string`
#[no_mangle]
pub unsafe extern "C" fn sc_table_col_name(
    session: *const FfiSession,
    kind: usize,
    index: usize,
) -> *mut c_char {
    session
        .as_ref()
        .and_then(|s| s.table(kind))
        .and_then(|t| t.columns.get(index))
        .map(|c| into_c_string(&c.name))
        .unwrap_or(ptr::null_mut())
}

/// Get a cell value as a string. Missing cells are empty strings.
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - Returns null if the table is not available or row or col is out of bounds
/// - Also returns null for a value containing a NUL byte
/// - Caller must free the returned string with `sc_free_string`
#[no_mangle]
pub unsafe extern "C" fn sc_table_cell(
    session: *const FfiSession,
    kind: usize,
    row: usize,
    col: usize,
) -> *mut c_char {
    session
        .as_ref()
        .and_then(|s| s.table(kind))
        .and_then(|t| t.rows.get(row))
        .and_then(|r| r.get(col))
        .map(|c| into_c_string(&c.to_string()))
        .unwrap_or(ptr::null_mut())
}

/// Write every available table to an XLSX workbook
///
/// # Safety
/// - `session` must be a valid pointer returned by `sc_session_new`
/// - `path` must be a valid C string
/// - Returns the number of sheets written, or -1 on error
#[no_mangle]
pub unsafe extern "C" fn sc_export_xlsx(
    session: *mut FfiSession,
    path: *const c_char,
    right_to_left: bool,
) -> i32 {
    let Some(session) = session.as_mut() else {
        return -1;
    };
    let Some(path) = to_str(path) else {
        return session.fail("path is null or not UTF-8".to_string());
    };

    match session
        .inner
        .export_workbook(path, &ExportOptions { right_to_left })
    {
        Ok(summary) => {
            session.last_error = None;
            i32::try_from(summary.written.len()).unwrap_or(i32::MAX)
        }
        Err(e) => session.fail(e.to_string()),
    }
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a sc_* function or null
#[no_mangle]
pub unsafe extern "C" fn sc_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
