// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! JNI binding for `com.edgedetector.jni.NativeProcessor`.
//!
//! ```kotlin
//! object NativeProcessor {
//!     init { System.loadLibrary("edge_detector") }
//!     external fun processEdges(imageData: ByteArray, width: Int, height: Int): ByteArray?
//! }
//! ```

use crate::boundary::process_frame;
use crate::edges::panic_message;
use ::jni::{
    objects::{JByteArray, JClass},
    sys::{jbyteArray, jint},
    JNIEnv,
};
use std::{
    panic::{self, AssertUnwindSafe},
    ptr,
};
use tracing::error;

/// `NativeProcessor.processEdges(ByteArray, Int, Int): ByteArray?`
///
/// Copies the NV21 frame out of the Java array, runs the pipeline and
/// returns a new RGBA array, or `null` when the frame has to be skipped.
/// No Java exception is left pending on return.
#[no_mangle]
pub extern "system" fn Java_com_edgedetector_jni_NativeProcessor_processEdges<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    image_data: JByteArray<'local>,
    width: jint,
    height: jint,
) -> jbyteArray {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        process_edges(&mut env, &image_data, width, height)
    }));

    let array = match result {
        Ok(array) => array,
        Err(payload) => {
            error!(width, height, "frame skipped: {}", panic_message(payload.as_ref()));
            ptr::null_mut()
        }
    };

    if env.exception_check().unwrap_or(false) {
        log_clear_failure(env.exception_clear(), width, height);
        return ptr::null_mut();
    }
    array
}

/// Logs a failed `ExceptionClear`; the exception then stays pending in the VM.
fn log_clear_failure(cleared: ::jni::errors::Result<()>, width: jint, height: jint) -> bool {
    match cleared {
        Ok(()) => true,
        Err(err) => {
            error!(width, height, "cannot clear pending java exception: {err}");
            false
        }
    }
}

fn process_edges(
    env: &mut JNIEnv,
    image_data: &JByteArray,
    width: jint,
    height: jint,
) -> jbyteArray {
    if image_data.is_null() {
        error!(width, height, "frame skipped: null image buffer");
        return ptr::null_mut();
    }

    let input = match env.convert_byte_array(image_data) {
        Ok(input) => input,
        Err(err) => {
            error!(width, height, "frame skipped: cannot read image buffer: {err}");
            return ptr::null_mut();
        }
    };

    let Some(output) = process_frame(&input, width, height) else {
        return ptr::null_mut();
    };

    match env.byte_array_from_slice(&output) {
        Ok(array) => array.into_raw(),
        Err(err) => {
            error!(
                width,
                height,
                "frame skipped: cannot allocate {} byte result: {err}",
                output.len()
            );
            ptr::null_mut()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_exception_clear_is_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(log_clear_failure(Ok(()), 64, 48));
            assert!(!log_clear_failure(
                Err(::jni::errors::Error::NullPtr("env")),
                64,
                48
            ));
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("cannot clear pending java exception").count(), 1);
        assert!(output.contains("width=64"));
    }
}
