mod helpers;
mod test_bump;
mod test_plan;
mod test_release;
mod test_rollback;
