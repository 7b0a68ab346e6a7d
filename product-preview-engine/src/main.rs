use engine::core::app_setup::create_app;
use engine::core::performance_profile::PerformanceProfile;

mod engine;
mod rpc;
mod tools;

fn main() {
    let mut app = create_app(PerformanceProfile::detect());

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}
