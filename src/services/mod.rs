// Services that sit beside the models: settings storage and the browser engine preferences it drives.

pub mod setting_manager;
