
mod gate;
mod navigation;
mod permissions;
mod users;
