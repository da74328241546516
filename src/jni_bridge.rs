//! JNI entry points for the Java plugin shell.
//!
//! The Java `Echo` plugin forwards `execute(action, args)` here as two
//! strings and sends the returned JSON `PluginResult` back to the webview.

use jni::objects::{GlobalRef, JClass, JObject, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use once_cell::sync::{Lazy, OnceCell};

use crate::config::AppConfig;
use crate::platform::mark_app_context_ready;
use crate::plugin::{execute_json, EchoPlugin, PluginResult};

static PLUGIN: Lazy<EchoPlugin> = Lazy::new(|| EchoPlugin::for_platform(&AppConfig::load()));

/// Activity context kept alive for ndk_context (Oboe and the vibrator).
static CONTEXT: OnceCell<GlobalRef> = OnceCell::new();

/// `static native void nativeInit(Context context)`
#[no_mangle]
pub extern "system" fn Java_org_cordova_plugins_metronome_Echo_nativeInit<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    context: JObject<'local>,
) {
    if CONTEXT.get().is_some() {
        return;
    }

    let vm = match env.get_java_vm() {
        Ok(vm) => vm,
        Err(err) => {
            log::error!("[JNI] Failed to get JavaVM: {:?}", err);
            return;
        }
    };
    let global = match env.new_global_ref(context) {
        Ok(global) => global,
        Err(err) => {
            log::error!("[JNI] Failed to pin context: {:?}", err);
            return;
        }
    };

    // SAFETY: both pointers stay valid for the life of the process; the
    // context is pinned by the global ref stored below.
    unsafe {
        ndk_context::initialize_android_context(
            vm.get_java_vm_pointer().cast(),
            global.as_obj().as_raw().cast(),
        );
    }
    let _ = CONTEXT.set(global);
    mark_app_context_ready();
    log::info!("[JNI] Android context initialized");
}

/// `static native String nativeExecute(String action, String argsJson)`
#[no_mangle]
pub extern "system" fn Java_org_cordova_plugins_metronome_Echo_nativeExecute<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    action: JString<'local>,
    args_json: JString<'local>,
) -> jstring {
    let response = match read_strings(&mut env, &action, &args_json) {
        Ok((action, args_json)) => execute_json(&*PLUGIN, &action, &args_json),
        Err(err) => serde_json::to_string(&PluginResult::json_exception(err))
            .unwrap_or_default(),
    };

    match env.new_string(response) {
        Ok(response) => response.into_raw(),
        Err(err) => {
            log::error!("[JNI] Failed to build result string: {:?}", err);
            std::ptr::null_mut()
        }
    }
}

fn read_strings(
    env: &mut JNIEnv,
    action: &JString,
    args_json: &JString,
) -> Result<(String, String), String> {
    let action: String = env
        .get_string(action)
        .map_err(|e| format!("Invalid action string: {:?}", e))?
        .into();
    let args_json: String = env
        .get_string(args_json)
        .map_err(|e| format!("Invalid args string: {:?}", e))?
        .into();
    Ok((action, args_json))
}
