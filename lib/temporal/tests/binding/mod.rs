mod after;
mod allen;
mod test_utils;
